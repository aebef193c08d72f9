//! Shared integration-test helpers: a recording handler, a lock around the
//! process-wide filter, and a runner for the CLI binary.

#![allow(dead_code)]

use std::process::{Command, Output};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use driverlog::bson::{RawBsonRef, RawDocument, RawDocumentBuf};
use driverlog::{Component, Entry, Level, StructuredLogOpts};

/// One entry as seen by [`RecordingHandler`].
#[derive(Debug, Clone)]
pub struct Recorded {
    pub level: Level,
    pub component: Component,
    pub message: String,
    pub document: RawDocumentBuf,
}

impl Recorded {
    /// Relaxed extended JSON of the materialized document.
    pub fn json(&self) -> String {
        driverlog_core::raw_relaxed_json(&self.document)
    }
}

/// Handler that materializes and keeps every entry it receives.
#[derive(Clone, Default)]
pub struct RecordingHandler {
    entries: Arc<Mutex<Vec<Recorded>>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with this handler installed and no environment influence.
    pub fn opts(&self) -> StructuredLogOpts {
        let entries = Arc::clone(&self.entries);
        StructuredLogOpts::from_lookup(|_| None).with_handler(move |entry: &Entry<'_>| {
            entries.lock().unwrap().push(Recorded {
                level: entry.level(),
                component: entry.component(),
                message: entry.message().to_string(),
                document: entry.materialize(),
            });
        })
    }

    pub fn entries(&self) -> Vec<Recorded> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn last(&self) -> Recorded {
        self.entries
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no entries recorded")
    }
}

/// Every value stored under `key`, in order.
pub fn get_all<'a>(document: &'a RawDocument, key: &str) -> Vec<RawBsonRef<'a>> {
    document
        .iter()
        .filter_map(Result::ok)
        .filter(|(k, _)| *k == key)
        .map(|(_, value)| value)
        .collect()
}

/// Serializes tests that change the process-wide filter.
pub fn filter_lock() -> MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Environment variables the pipeline reads; cleared for every CLI run.
const PIPELINE_VARS: [&str; 7] = [
    "MONGODB_LOG_ALL",
    "MONGODB_LOG_COMMAND",
    "MONGODB_LOG_TOPOLOGY",
    "MONGODB_LOG_SERVER_SELECTION",
    "MONGODB_LOG_CONNECTION",
    "MONGODB_LOG_PATH",
    "MONGODB_LOG_MAX_DOCUMENT_LENGTH",
];

/// Runs the `driverlog` binary with `args` and extra environment.
pub fn run_cli(args: &[&str], env: &[(&str, &str)]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_driverlog"));
    for var in PIPELINE_VARS {
        command.env_remove(var);
    }
    command
        .env_remove("DRIVERLOG_CONFIG")
        .env_remove("DRIVERLOG_DIAGNOSTICS")
        .env_remove("DRIVERLOG_LOG_FORMAT")
        .args(args)
        .envs(env.iter().copied())
        .output()
        .expect("failed to run driverlog")
}
