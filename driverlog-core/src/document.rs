//! JSON rendering of logged documents.
//!
//! Commands and replies are `bson` documents. Materialized log entries are
//! raw documents, which keep duplicate keys in insertion order. Both render
//! as relaxed extended JSON, bounded by [`MaxDocumentLength`].

use std::fmt;
use std::str::FromStr;

use bson::{Bson, Document, RawBsonRef, RawDocument};
use serde::de::{self, Deserializer, Visitor};
use serde::ser::{self as ser, SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, DocumentError};

// ============================================================================
// Rendering
// ============================================================================

/// Relaxed extended JSON text of `doc`.
#[must_use]
pub fn relaxed_json(doc: &Document) -> String {
    Bson::Document(doc.clone()).into_relaxed_extjson().to_string()
}

/// [`relaxed_json`], truncated to `limit`.
#[must_use]
pub fn relaxed_json_limited(doc: &Document, limit: MaxDocumentLength) -> String {
    limit.truncate(relaxed_json(doc))
}

/// Serializes a raw document as a relaxed extended JSON object.
///
/// Unlike converting to a [`Document`] first, every element is written,
/// so repeated keys all appear, in order.
#[derive(Debug, Clone, Copy)]
pub struct RelaxedJson<'a>(pub &'a RawDocument);

impl Serialize for RelaxedJson<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for element in self.0 {
            let (key, value) = element.map_err(ser::Error::custom)?;
            map.serialize_entry(key, &relaxed_value(value).map_err(ser::Error::custom)?)?;
        }
        map.end()
    }
}

fn relaxed_value(value: RawBsonRef<'_>) -> Result<serde_json::Value, bson::raw::Error> {
    Ok(Bson::try_from(value)?.into_relaxed_extjson())
}

/// Relaxed extended JSON text of a raw document, duplicate keys included.
///
/// A malformed document renders as `{}`.
#[must_use]
pub fn raw_relaxed_json(doc: &RawDocument) -> String {
    serde_json::to_string(&RelaxedJson(doc)).unwrap_or_else(|_| String::from("{}"))
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses extended JSON text into a document, preserving key order.
///
/// Integers that fit are `Int32`, larger ones `Int64`.
///
/// # Errors
///
/// Returns `DocumentError::Json` for malformed input,
/// `DocumentError::NotAnObject` when the top level is not an object, and
/// `DocumentError::ExtJson` for invalid extended JSON such as a bad `$oid`.
pub fn parse_json_document(json: &str) -> Result<Document, DocumentError> {
    match serde_json::from_str::<serde_json::Value>(json)? {
        serde_json::Value::Object(map) => Ok(Document::try_from(map)?),
        other => Err(DocumentError::NotAnObject(json_kind(&other))),
    }
}

const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

// ============================================================================
// MaxDocumentLength
// ============================================================================

/// Upper bound on the length of JSON text produced for logged documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxDocumentLength {
    /// Truncate after this many bytes.
    Limited(usize),
    /// Never truncate.
    Unlimited,
}

impl MaxDocumentLength {
    pub const DEFAULT_LIMIT: usize = 1000;

    /// Truncates `json` to the limit, never splitting a UTF-8 sequence.
    ///
    /// Truncated text is followed by `...`, which does not count against
    /// the limit.
    #[must_use]
    pub fn truncate(self, mut json: String) -> String {
        if let Self::Limited(max) = self {
            if json.len() > max {
                let mut end = max;
                while !json.is_char_boundary(end) {
                    end -= 1;
                }
                json.truncate(end);
                json.push_str("...");
            }
        }
        json
    }
}

impl Default for MaxDocumentLength {
    fn default() -> Self {
        Self::Limited(Self::DEFAULT_LIMIT)
    }
}

impl fmt::Display for MaxDocumentLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limited(n) => write!(f, "{n}"),
            Self::Unlimited => f.write_str("unlimited"),
        }
    }
}

impl FromStr for MaxDocumentLength {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("unlimited") {
            return Ok(Self::Unlimited);
        }
        s.parse::<usize>()
            .map(Self::Limited)
            .map_err(|_| ConfigError::InvalidValue {
                field: "max_document_length".to_string(),
                value: s.to_string(),
                expected: "a byte count or \"unlimited\"".to_string(),
            })
    }
}

impl Serialize for MaxDocumentLength {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Self::Limited(n) => serializer.serialize_u64(n as u64),
            Self::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

impl<'de> Deserialize<'de> for MaxDocumentLength {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LengthVisitor;

        impl Visitor<'_> for LengthVisitor {
            type Value = MaxDocumentLength;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a byte count or \"unlimited\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                usize::try_from(v)
                    .map(MaxDocumentLength::Limited)
                    .map_err(|_| E::custom("max document length out of range"))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                usize::try_from(v)
                    .map(MaxDocumentLength::Limited)
                    .map_err(|_| E::custom("max document length must not be negative"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(LengthVisitor)
    }
}
