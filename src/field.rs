//! Field values carried by structured log entries.
//!
//! A [`Field`] is a cheap, `Copy` descriptor that only borrows the caller's
//! data. Constructing one never formats, hex-encodes, redacts, or copies a
//! document; that work happens in [`Entry::materialize`], and only if a
//! handler asks for it.
//!
//! A field whose key is `None`, or whose referenced value is `None`,
//! contributes nothing to the materialized document. It still occupies its
//! slot in the entry; nothing is reordered or compacted.
//!
//! [`Entry::materialize`]: crate::entry::Entry::materialize

use bitflags::bitflags;
use bson::oid::ObjectId;
use bson::{Document, RawBson, RawDocumentBuf};

use driverlog_core::MaxDocumentLength;

use crate::command::{Cmd, CommandError};
use crate::redact;
use crate::server_description::ServerDescription;

pub const KEY_DURATION_MS: &str = "durationMS";
pub const KEY_DURATION_MICROS: &str = "durationMicros";
pub const KEY_SERVER_HOST: &str = "serverHost";
pub const KEY_SERVER_PORT: &str = "serverPort";
pub const KEY_SERVER_CONNECTION_ID: &str = "serverConnectionId";
pub const KEY_SERVICE_ID: &str = "serviceId";
pub const KEY_DATABASE_NAME: &str = "databaseName";
pub const KEY_COMMAND_NAME: &str = "commandName";
pub const KEY_OPERATION_ID: &str = "operationId";
pub const KEY_COMMAND: &str = "command";
pub const KEY_REPLY: &str = "reply";
pub const KEY_FAILURE: &str = "failure";

bitflags! {
    /// Which parts of a [`ServerDescription`] a field reports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ServerDescriptionFlags: u8 {
        const SERVER_HOST = 1 << 0;
        const SERVER_PORT = 1 << 1;
        const SERVER_CONNECTION_ID = 1 << 2;
        const SERVICE_ID = 1 << 3;
    }
}

bitflags! {
    /// Which parts of a [`Cmd`] a field reports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CmdFlags: u8 {
        const COMMAND = 1 << 0;
        const DATABASE_NAME = 1 << 1;
        const COMMAND_NAME = 1 << 2;
        const OPERATION_ID = 1 << 3;
    }
}

/// One field of a structured log entry.
#[derive(Debug, Clone, Copy)]
pub enum Field<'a> {
    /// Contributes nothing.
    Omitted,
    Utf8 {
        key: Option<&'a str>,
        value: Option<&'a str>,
    },
    Int32 {
        key: Option<&'a str>,
        value: i32,
    },
    Int64 {
        key: Option<&'a str>,
        value: i64,
    },
    Bool {
        key: Option<&'a str>,
        value: bool,
    },
    /// Identifier rendered as lowercase hex at materialization.
    OidAsHex {
        key: Option<&'a str>,
        oid: Option<&'a ObjectId>,
    },
    /// Document rendered as JSON text at materialization.
    DocumentAsJson {
        key: Option<&'a str>,
        document: Option<&'a Document>,
    },
    /// A monotonic duration; materializes as `durationMS` and
    /// `durationMicros`.
    Duration { millis: i64, micros: i64 },
    /// Selected parts of a server description.
    Server {
        description: &'a ServerDescription,
        flags: ServerDescriptionFlags,
    },
    /// Selected parts of an in-flight command.
    Command { cmd: &'a Cmd<'a>, flags: CmdFlags },
    /// A successful reply, redacted for sensitive commands.
    Reply {
        command_name: &'a str,
        reply: &'a Document,
    },
    /// A command failure, shaped by where the error came from.
    Failure {
        command_name: &'a str,
        reply: &'a Document,
        error: &'a CommandError,
    },
}

impl<'a> Field<'a> {
    #[must_use]
    pub const fn utf8(key: &'a str, value: &'a str) -> Self {
        Self::Utf8 {
            key: Some(key),
            value: Some(value),
        }
    }

    /// String field that is omitted when either side is absent.
    #[must_use]
    pub const fn utf8_opt(key: Option<&'a str>, value: Option<&'a str>) -> Self {
        match (key, value) {
            (Some(_), Some(_)) => Self::Utf8 { key, value },
            _ => Self::Omitted,
        }
    }

    #[must_use]
    pub const fn int32(key: &'a str, value: i32) -> Self {
        Self::Int32 {
            key: Some(key),
            value,
        }
    }

    #[must_use]
    pub const fn int64(key: &'a str, value: i64) -> Self {
        Self::Int64 {
            key: Some(key),
            value,
        }
    }

    #[must_use]
    pub const fn boolean(key: &'a str, value: bool) -> Self {
        Self::Bool {
            key: Some(key),
            value,
        }
    }

    #[must_use]
    pub const fn oid_as_hex(key: &'a str, oid: &'a ObjectId) -> Self {
        Self::OidAsHex {
            key: Some(key),
            oid: Some(oid),
        }
    }

    #[must_use]
    pub const fn oid_as_hex_opt(key: Option<&'a str>, oid: Option<&'a ObjectId>) -> Self {
        match (key, oid) {
            (Some(_), Some(_)) => Self::OidAsHex { key, oid },
            _ => Self::Omitted,
        }
    }

    #[must_use]
    pub const fn document_as_json(key: &'a str, document: &'a Document) -> Self {
        Self::DocumentAsJson {
            key: Some(key),
            document: Some(document),
        }
    }

    #[must_use]
    pub const fn document_as_json_opt(
        key: Option<&'a str>,
        document: Option<&'a Document>,
    ) -> Self {
        match (key, document) {
            (Some(_), Some(_)) => Self::DocumentAsJson { key, document },
            _ => Self::Omitted,
        }
    }

    /// Duration measured in monotonic microseconds.
    ///
    /// Milliseconds are computed here, by truncating division.
    #[must_use]
    pub const fn duration(micros: i64) -> Self {
        Self::Duration {
            millis: micros / 1000,
            micros,
        }
    }

    #[must_use]
    pub const fn server_description(
        description: &'a ServerDescription,
        flags: ServerDescriptionFlags,
    ) -> Self {
        Self::Server { description, flags }
    }

    #[must_use]
    pub const fn command(cmd: &'a Cmd<'a>, flags: CmdFlags) -> Self {
        Self::Command { cmd, flags }
    }

    #[must_use]
    pub const fn command_reply(command_name: &'a str, reply: &'a Document) -> Self {
        Self::Reply {
            command_name,
            reply,
        }
    }

    #[must_use]
    pub const fn command_failure(
        command_name: &'a str,
        reply: &'a Document,
        error: &'a CommandError,
    ) -> Self {
        Self::Failure {
            command_name,
            reply,
            error,
        }
    }

    /// Keeps the field only when `condition` holds.
    #[must_use]
    pub const fn when(self, condition: bool) -> Self {
        if condition { self } else { Self::Omitted }
    }

    /// True if this field contributes nothing when materialized.
    #[must_use]
    pub const fn is_omitted(&self) -> bool {
        matches!(
            self,
            Self::Omitted
                | Self::Utf8 { key: None, .. }
                | Self::Utf8 { value: None, .. }
                | Self::Int32 { key: None, .. }
                | Self::Int64 { key: None, .. }
                | Self::Bool { key: None, .. }
                | Self::OidAsHex { key: None, .. }
                | Self::OidAsHex { oid: None, .. }
                | Self::DocumentAsJson { key: None, .. }
                | Self::DocumentAsJson { document: None, .. }
        )
    }

    /// Appends this field's materialized form to `doc`.
    ///
    /// Document-valued fields are rendered as JSON text bounded by `limit`.
    /// A failure is appended as an embedded document.
    pub(crate) fn append_to(&self, doc: &mut RawDocumentBuf, limit: MaxDocumentLength) {
        match *self {
            Self::Utf8 {
                key: Some(key),
                value: Some(value),
            } => put(doc, key, value),
            Self::Int32 {
                key: Some(key),
                value,
            } => put(doc, key, value),
            Self::Int64 {
                key: Some(key),
                value,
            } => put(doc, key, value),
            Self::Bool {
                key: Some(key),
                value,
            } => put(doc, key, value),
            Self::OidAsHex {
                key: Some(key),
                oid: Some(oid),
            } => put(doc, key, oid.to_hex()),
            Self::DocumentAsJson {
                key: Some(key),
                document: Some(document),
            } => put(doc, key, driverlog_core::relaxed_json_limited(document, limit)),
            Self::Duration { millis, micros } => {
                let millis = i32::try_from(millis).map_or(RawBson::Int64(millis), RawBson::Int32);
                put(doc, KEY_DURATION_MS, millis);
                put(doc, KEY_DURATION_MICROS, micros);
            }
            Self::Server { description, flags } => append_server_description(doc, description, flags),
            Self::Command { cmd, flags } => append_cmd(doc, cmd, flags, limit),
            Self::Reply {
                command_name,
                reply,
            } => put(doc, KEY_REPLY, redact::reply_json(command_name, reply, limit)),
            Self::Failure {
                command_name,
                reply,
                error,
            } => append_failure(doc, &redact::failure_document(command_name, reply, error)),
            _ => {}
        }
    }
}

/// Appends one element. Keys containing NUL cannot be encoded and are
/// dropped.
fn put(doc: &mut RawDocumentBuf, key: &str, value: impl Into<RawBson>) {
    if key.contains('\0') {
        tracing::debug!(key = %key.escape_debug(), "dropping log field with NUL in key");
        return;
    }
    doc.append(key, value);
}

fn append_failure(doc: &mut RawDocumentBuf, failure: &Document) {
    match RawDocumentBuf::from_document(failure) {
        Ok(raw) => put(doc, KEY_FAILURE, raw),
        Err(e) => tracing::debug!(error = %e, "cannot encode failure document"),
    }
}

/// Expands a server description into the subfields selected by `flags`,
/// in flag declaration order. `serviceId` is left out when the server has
/// none.
fn append_server_description(
    doc: &mut RawDocumentBuf,
    sd: &ServerDescription,
    flags: ServerDescriptionFlags,
) {
    if flags.contains(ServerDescriptionFlags::SERVER_HOST) {
        put(doc, KEY_SERVER_HOST, sd.host.as_str());
    }
    if flags.contains(ServerDescriptionFlags::SERVER_PORT) {
        put(doc, KEY_SERVER_PORT, i32::from(sd.port));
    }
    if flags.contains(ServerDescriptionFlags::SERVER_CONNECTION_ID) {
        put(doc, KEY_SERVER_CONNECTION_ID, sd.server_connection_id);
    }
    let service_id = sd
        .service_id
        .filter(|_| flags.contains(ServerDescriptionFlags::SERVICE_ID));
    if let Some(service_id) = service_id {
        put(doc, KEY_SERVICE_ID, service_id.to_hex());
    }
}

// Database and command names come before the command body.
fn append_cmd(doc: &mut RawDocumentBuf, cmd: &Cmd<'_>, flags: CmdFlags, limit: MaxDocumentLength) {
    if flags.contains(CmdFlags::DATABASE_NAME) {
        put(doc, KEY_DATABASE_NAME, cmd.db_name);
    }
    if flags.contains(CmdFlags::COMMAND_NAME) {
        put(doc, KEY_COMMAND_NAME, cmd.command_name);
    }
    if flags.contains(CmdFlags::OPERATION_ID) {
        put(doc, KEY_OPERATION_ID, cmd.operation_id);
    }
    if flags.contains(CmdFlags::COMMAND) {
        put(doc, KEY_COMMAND, redact::command_json(cmd, limit));
    }
}
