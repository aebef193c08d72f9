//! Redaction of security-sensitive command traffic.
//!
//! Authentication commands carry credentials in both directions. Their
//! bodies and replies are replaced with an empty document before logging,
//! and server failures are reduced to the error code alone.

use bson::{Bson, Document, doc};
use driverlog_core::{MaxDocumentLength, relaxed_json, relaxed_json_limited};

use crate::command::{Cmd, CommandError, ErrorOrigin};

/// Commands whose bodies and replies are always redacted.
pub const SENSITIVE_COMMANDS: [&str; 9] = [
    "authenticate",
    "saslStart",
    "saslContinue",
    "getnonce",
    "createUser",
    "updateUser",
    "copydbgetnonce",
    "copydbsaslstart",
    "copydb",
];

const SPECULATIVE_AUTHENTICATE: &str = "speculativeAuthenticate";

/// True if `command_name` is always sensitive, regardless of body.
#[must_use]
pub fn is_sensitive_command_name(command_name: &str) -> bool {
    SENSITIVE_COMMANDS
        .iter()
        .any(|name| name.eq_ignore_ascii_case(command_name))
}

/// True if a command or reply with this name and body must be redacted.
///
/// A handshake (`hello` or legacy `isMaster`) is sensitive only when it
/// piggybacks authentication via `speculativeAuthenticate`.
#[must_use]
pub fn is_sensitive_command_message(command_name: &str, body: &Document) -> bool {
    if is_sensitive_command_name(command_name) {
        return true;
    }
    let is_handshake = command_name.eq_ignore_ascii_case("hello")
        || command_name.eq_ignore_ascii_case("isMaster");
    is_handshake && body.contains_key(SPECULATIVE_AUTHENTICATE)
}

/// JSON text of a command, bounded by `limit`.
///
/// Each payload sequence is added to a copy of the body as an array under
/// its identifier, after the body's own keys. A sensitive command renders
/// as `{}` and its payloads are not looked at.
#[must_use]
pub fn command_json(cmd: &Cmd<'_>, limit: MaxDocumentLength) -> String {
    if is_sensitive_command_message(cmd.command_name, cmd.command) {
        return relaxed_json(&Document::new());
    }
    if cmd.payloads.is_empty() {
        return relaxed_json_limited(cmd.command, limit);
    }
    let mut full = cmd.command.clone();
    for payload in cmd.payloads {
        let documents = payload
            .documents
            .iter()
            .cloned()
            .map(Bson::Document)
            .collect::<Vec<_>>();
        full.insert(payload.identifier, documents);
    }
    relaxed_json_limited(&full, limit)
}

/// JSON text of a successful reply, bounded by `limit`. `{}` when the
/// reply belongs to a sensitive exchange.
#[must_use]
pub fn reply_json(command_name: &str, reply: &Document, limit: MaxDocumentLength) -> String {
    if is_sensitive_command_message(command_name, reply) {
        relaxed_json(&Document::new())
    } else {
        relaxed_json_limited(reply, limit)
    }
}

/// Document describing a command failure.
///
/// Server-side errors reuse the server's reply. For a sensitive exchange
/// only a numeric `code` survives; a `code` of any other type is dropped
/// with the rest of the reply. Client-side errors have no reply and are
/// described by the error's code, domain and message.
#[must_use]
pub fn failure_document(command_name: &str, reply: &Document, error: &CommandError) -> Document {
    match error.origin() {
        ErrorOrigin::Server if is_sensitive_command_message(command_name, reply) => {
            let mut redacted = Document::new();
            if let Some(code @ (Bson::Int32(_) | Bson::Int64(_))) = reply.get("code") {
                redacted.insert("code", code.clone());
            }
            redacted
        }
        ErrorOrigin::Server => reply.clone(),
        ErrorOrigin::Local => doc! {
            "code": int_value(error.code),
            "domain": int_value(error.domain),
            "message": error.message.as_str(),
        },
    }
}

/// `Int32` when `n` fits, else `Int64`.
fn int_value(n: u32) -> Bson {
    i32::try_from(n).map_or(Bson::Int64(i64::from(n)), Bson::Int32)
}
