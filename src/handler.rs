//! Built-in structured log handlers.
//!
//! [`StreamHandler`] writes each entry as one JSON line to stderr, stdout,
//! or a file. [`TracingHandler`] forwards entries to the `tracing`
//! ecosystem so applications that already run a subscriber can fold driver
//! logs into it.

use std::fmt;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use driverlog_core::{Level, RelaxedJson};

use crate::entry::Entry;
use crate::log::StructuredLogHandler;

// ============================================================================
// Target
// ============================================================================

/// Where a [`StreamHandler`] writes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogTarget {
    #[default]
    Stderr,
    Stdout,
    /// Appended to; created if missing.
    File(PathBuf),
}

impl LogTarget {
    /// Interprets a path setting. `stdout` and `stderr` (any case) name the
    /// standard streams; anything else is a file path. `None` is stderr.
    #[must_use]
    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::Stderr,
            Some(v) if v.eq_ignore_ascii_case("stderr") => Self::Stderr,
            Some(v) if v.eq_ignore_ascii_case("stdout") => Self::Stdout,
            Some(path) => Self::File(PathBuf::from(path)),
        }
    }
}

impl fmt::Display for LogTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stderr => f.write_str("stderr"),
            Self::Stdout => f.write_str("stdout"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl FromStr for LogTarget {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_setting(Some(s)))
    }
}

impl<'de> Deserialize<'de> for LogTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_setting(Some(&value)))
    }
}

// ============================================================================
// StreamHandler
// ============================================================================

type SharedWriter = Mutex<BufWriter<Box<dyn Write + Send>>>;

/// One JSON line per entry.
#[derive(Serialize)]
struct LogLine<'a> {
    timestamp: DateTime<Utc>,
    level: Level,
    component: String,
    #[serde(flatten)]
    body: RelaxedJson<'a>,
}

/// Writes entries as newline-delimited JSON.
///
/// The target is opened on the first entry, not at construction. Write
/// failures are dropped: logging must never fail the operation being
/// logged.
pub struct StreamHandler {
    target: LogTarget,
    writer: OnceLock<SharedWriter>,
}

// Box<dyn Write> is not Debug.
impl fmt::Debug for StreamHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandler")
            .field("target", &self.target)
            .field("opened", &self.writer.get().is_some())
            .finish()
    }
}

impl StreamHandler {
    #[must_use]
    pub const fn new(target: LogTarget) -> Self {
        Self {
            target,
            writer: OnceLock::new(),
        }
    }

    /// A handler that writes to `writer` instead of a named target.
    #[must_use]
    pub fn from_writer(writer: Box<dyn Write + Send>) -> Self {
        let handler = Self::new(LogTarget::Stderr);
        let _ = handler.writer.set(Mutex::new(BufWriter::new(writer)));
        handler
    }

    #[must_use]
    pub const fn target(&self) -> &LogTarget {
        &self.target
    }

    fn writer(&self) -> &SharedWriter {
        self.writer
            .get_or_init(|| Mutex::new(BufWriter::new(open_target(&self.target))))
    }
}

fn open_target(target: &LogTarget) -> Box<dyn Write + Send> {
    match target {
        LogTarget::Stderr => Box::new(std::io::stderr()),
        LogTarget::Stdout => Box::new(std::io::stdout()),
        LogTarget::File(path) => {
            match std::fs::OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => {
                    tracing::debug!(path = %path.display(), "opened structured log file");
                    Box::new(file)
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "cannot open structured log file, writing to stderr"
                    );
                    Box::new(std::io::stderr())
                }
            }
        }
    }
}

impl StructuredLogHandler for StreamHandler {
    fn handle(&self, entry: &Entry<'_>) {
        let body = entry.materialize();
        let line = LogLine {
            timestamp: Utc::now(),
            level: entry.level(),
            component: entry.component().to_string(),
            body: RelaxedJson(&body),
        };
        let Ok(json) = serde_json::to_string(&line) else {
            return;
        };
        let mut writer = self.writer().lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(writer, "{json}");
        let _ = writer.flush();
    }
}

// ============================================================================
// TracingHandler
// ============================================================================

/// Target used for events emitted by [`TracingHandler`].
pub const TRACING_TARGET: &str = "driverlog";

/// Forwards entries to `tracing` events.
///
/// Levels map onto `tracing`'s five: Emergency through Error become
/// `ERROR`, Notice and Informational become `INFO`. The materialized
/// document is attached as a JSON `fields` value.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHandler;

impl TracingHandler {
    #[must_use]
    pub const fn tracing_level(level: Level) -> tracing::Level {
        match level {
            Level::Emergency | Level::Alert | Level::Critical | Level::Error => {
                tracing::Level::ERROR
            }
            Level::Warning => tracing::Level::WARN,
            Level::Notice | Level::Informational => tracing::Level::INFO,
            Level::Debug => tracing::Level::DEBUG,
            Level::Trace => tracing::Level::TRACE,
        }
    }
}

macro_rules! forward {
    ($level:expr, $entry:expr) => {{
        let entry: &Entry<'_> = $entry;
        if tracing::enabled!(target: TRACING_TARGET, $level) {
            let fields = entry.to_json();
            tracing::event!(
                target: TRACING_TARGET,
                $level,
                component = %entry.component(),
                severity = entry.level().name(),
                fields = %fields,
                "{}",
                entry.message()
            );
        }
    }};
}

impl StructuredLogHandler for TracingHandler {
    fn handle(&self, entry: &Entry<'_>) {
        // `event!` needs its level at compile time.
        let level = Self::tracing_level(entry.level());
        if level == tracing::Level::ERROR {
            forward!(tracing::Level::ERROR, entry);
        } else if level == tracing::Level::WARN {
            forward!(tracing::Level::WARN, entry);
        } else if level == tracing::Level::INFO {
            forward!(tracing::Level::INFO, entry);
        } else if level == tracing::Level::DEBUG {
            forward!(tracing::Level::DEBUG, entry);
        } else {
            forward!(tracing::Level::TRACE, entry);
        }
    }
}
