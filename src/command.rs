//! Command lifecycle events.
//!
//! Each emitter first invokes the matching APM callback, if one is
//! registered, then publishes a structured log message on the `command`
//! component at `Debug` level.

use thiserror::Error;

use bson::Document;
use driverlog_core::{Component, Level};

use crate::apm::{CommandFailedEvent, CommandStartedEvent, CommandSucceededEvent};
use crate::field::{CmdFlags, Field, ServerDescriptionFlags};
use crate::monitor::LogAndMonitorInstance;
use crate::server_description::ServerDescription;
use crate::structured_log;

pub const MSG_COMMAND_STARTED: &str = "Command started";
pub const MSG_COMMAND_SUCCEEDED: &str = "Command succeeded";
pub const MSG_COMMAND_FAILED: &str = "Command failed";

// ============================================================================
// Command shapes
// ============================================================================

/// A document sequence sent alongside a command body.
#[derive(Debug, Clone, Copy)]
pub struct CmdPayload<'a> {
    /// Name the sequence is merged under, e.g. `documents`.
    pub identifier: &'a str,
    pub documents: &'a [Document],
}

/// An in-flight command, borrowed from the caller.
#[derive(Debug, Clone, Copy)]
pub struct Cmd<'a> {
    pub db_name: &'a str,
    pub command_name: &'a str,
    pub operation_id: i64,
    pub command: &'a Document,
    pub payloads: &'a [CmdPayload<'a>],
}

impl<'a> Cmd<'a> {
    #[must_use]
    pub const fn new(db_name: &'a str, command_name: &'a str, command: &'a Document) -> Self {
        Self {
            db_name,
            command_name,
            operation_id: 0,
            command,
            payloads: &[],
        }
    }

    #[must_use]
    pub const fn with_operation_id(mut self, operation_id: i64) -> Self {
        self.operation_id = operation_id;
        self
    }

    #[must_use]
    pub const fn with_payloads(mut self, payloads: &'a [CmdPayload<'a>]) -> Self {
        self.payloads = payloads;
        self
    }
}

/// Where a command error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOrigin {
    /// The server replied with an error.
    Server,
    /// The driver failed before or while receiving a reply.
    Local,
}

/// An error attached to a failed command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (domain {domain}, code {code})")]
pub struct CommandError {
    pub domain: u32,
    pub code: u32,
    pub message: String,
}

impl CommandError {
    /// Domain of errors reported by the server in a command reply.
    pub const DOMAIN_SERVER: u32 = 17;
    /// Domain of write concern errors reported by the server.
    pub const DOMAIN_WRITE_CONCERN: u32 = 16;

    #[must_use]
    pub fn server(code: u32, message: impl Into<String>) -> Self {
        Self {
            domain: Self::DOMAIN_SERVER,
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn local(domain: u32, code: u32, message: impl Into<String>) -> Self {
        Self {
            domain,
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        match self.domain {
            Self::DOMAIN_SERVER | Self::DOMAIN_WRITE_CONCERN => ErrorOrigin::Server,
            _ => ErrorOrigin::Local,
        }
    }
}

// ============================================================================
// Emitters
// ============================================================================

impl LogAndMonitorInstance {
    /// Reports that `cmd` is about to be sent to `server`.
    pub fn command_started(&self, cmd: &Cmd<'_>, request_id: i32, server: &ServerDescription) {
        self.with_apm(|callbacks, context| {
            if let Some(callback) = &callbacks.command_started {
                callback(&CommandStartedEvent {
                    command: cmd.command,
                    database_name: cmd.db_name,
                    command_name: cmd.command_name,
                    request_id,
                    operation_id: cmd.operation_id,
                    server,
                    context,
                });
            }
        });

        structured_log!(
            self.structured_log(),
            Level::Debug,
            Component::COMMAND,
            MSG_COMMAND_STARTED,
            Field::int32("requestId", request_id),
            Field::server_description(server, ServerDescriptionFlags::all()),
            Field::command(cmd, CmdFlags::all()),
        );
    }

    /// Reports that `cmd` completed with an ok `reply`.
    pub fn command_succeeded(
        &self,
        cmd: &Cmd<'_>,
        request_id: i32,
        server: &ServerDescription,
        duration_micros: i64,
        reply: &Document,
    ) {
        self.with_apm(|callbacks, context| {
            if let Some(callback) = &callbacks.command_succeeded {
                callback(&CommandSucceededEvent {
                    duration_micros,
                    reply,
                    database_name: cmd.db_name,
                    command_name: cmd.command_name,
                    request_id,
                    operation_id: cmd.operation_id,
                    server,
                    context,
                });
            }
        });

        structured_log!(
            self.structured_log(),
            Level::Debug,
            Component::COMMAND,
            MSG_COMMAND_SUCCEEDED,
            Field::int32("requestId", request_id),
            Field::server_description(server, ServerDescriptionFlags::all()),
            Field::command(
                cmd,
                CmdFlags::DATABASE_NAME | CmdFlags::COMMAND_NAME | CmdFlags::OPERATION_ID
            ),
            Field::duration(duration_micros),
            Field::command_reply(cmd.command_name, reply),
        );
    }

    /// Reports that `cmd` failed with `error`.
    ///
    /// `reply` is the server's reply for server-side errors and may be empty
    /// for errors raised locally.
    pub fn command_failed(
        &self,
        cmd: &Cmd<'_>,
        request_id: i32,
        server: &ServerDescription,
        duration_micros: i64,
        reply: &Document,
        error: &CommandError,
    ) {
        self.with_apm(|callbacks, context| {
            if let Some(callback) = &callbacks.command_failed {
                callback(&CommandFailedEvent {
                    duration_micros,
                    reply,
                    error,
                    database_name: cmd.db_name,
                    command_name: cmd.command_name,
                    request_id,
                    operation_id: cmd.operation_id,
                    server,
                    context,
                });
            }
        });

        structured_log!(
            self.structured_log(),
            Level::Debug,
            Component::COMMAND,
            MSG_COMMAND_FAILED,
            Field::int32("requestId", request_id),
            Field::server_description(server, ServerDescriptionFlags::all()),
            Field::command(
                cmd,
                CmdFlags::DATABASE_NAME | CmdFlags::COMMAND_NAME | CmdFlags::OPERATION_ID
            ),
            Field::duration(duration_micros),
            Field::command_failure(cmd.command_name, reply, error),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_domains_are_server_origin() {
        assert_eq!(CommandError::server(11000, "dup").origin(), ErrorOrigin::Server);
        let wc = CommandError::local(CommandError::DOMAIN_WRITE_CONCERN, 64, "wc");
        assert_eq!(wc.origin(), ErrorOrigin::Server);
        assert_eq!(CommandError::local(2, 1, "io").origin(), ErrorOrigin::Local);
    }

    #[test]
    fn command_error_display() {
        let err = CommandError::local(2, 3, "socket closed");
        assert_eq!(err.to_string(), "socket closed (domain 2, code 3)");
    }

    #[test]
    fn cmd_builder_defaults() {
        let body = Document::new();
        let cmd = Cmd::new("db", "ping", &body);
        assert_eq!(cmd.operation_id, 0);
        assert!(cmd.payloads.is_empty());
        assert_eq!(cmd.with_operation_id(7).operation_id, 7);
    }
}
