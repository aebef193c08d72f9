//! `driverlog` core: shared value types
//!
//! Severity levels, logging components, and JSON rendering of `bson`
//! documents. Shared between `driverlog` (pipeline, handlers, CLI) and its
//! fuzz targets.

pub mod document;
pub mod error;
pub mod level;

pub use document::{
    MaxDocumentLength, RelaxedJson, parse_json_document, raw_relaxed_json, relaxed_json,
    relaxed_json_limited,
};
pub use error::{ConfigError, DocumentError};
pub use level::{Component, Level};
