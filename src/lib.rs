//! `driverlog`: structured logging and monitoring for a database driver
//!
//! Subsystems emit typed events through a [`LogAndMonitorInstance`]. Each
//! event goes to the registered APM callbacks and, if the per-component
//! severity filter lets it through, to a structured log handler that can
//! materialize it into a `bson` document on demand.
//!
//! ```
//! use std::sync::{Arc, Mutex};
//!
//! use driverlog::{
//!     Component, Entry, Field, Level, LogAndMonitorInstance, StructuredLogOpts, filter,
//! };
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! let opts = StructuredLogOpts::from_lookup(|_| None).with_handler(move |entry: &Entry<'_>| {
//!     sink.lock().unwrap().push(entry.to_json());
//! });
//! let instance = LogAndMonitorInstance::with_structured_log_opts(&opts);
//!
//! filter::set_max_level(Component::CONNECTION, Level::Debug);
//! instance.log(
//!     Level::Debug,
//!     Component::CONNECTION,
//!     "Connection ready",
//!     &[Field::int64("driverConnectionId", 3)],
//! );
//! assert_eq!(
//!     seen.lock().unwrap()[0],
//!     r#"{"message":"Connection ready","driverConnectionId":3}"#
//! );
//! ```

pub mod apm;
pub mod cli;
pub mod command;
pub mod config;
pub mod connection;
pub mod entry;
pub mod error;
pub mod field;
pub mod filter;
pub mod handler;
pub mod log;
pub mod monitor;
pub mod observability;
pub mod redact;
pub mod server_description;
pub mod topology;

pub use bson;
pub use driverlog_core::{Component, Level, MaxDocumentLength};

pub use apm::{ApmCallbacks, ApmContext};
pub use command::{Cmd, CmdPayload, CommandError, ErrorOrigin};
pub use config::LogSettings;
pub use entry::{Entry, Envelope};
pub use error::{DriverLogError, ExitCode};
pub use field::{CmdFlags, Field, ServerDescriptionFlags};
pub use handler::{LogTarget, StreamHandler, TracingHandler};
pub use log::{SharedHandler, StructuredLogHandler, StructuredLogInstance, StructuredLogOpts};
pub use monitor::{LogAndMonitorInstance, Serial};
pub use server_description::ServerDescription;
