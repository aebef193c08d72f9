//! Core error types for `driverlog`
//!
//! Configuration and document error types shared across the workspace.
//! None of these are raised by the logging fast path: name lookups there
//! return `Option`, and misconfigured environments are ignored.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Configuration Errors
// ============================================================================

/// Errors produced while parsing logging settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Settings file could not be parsed
    #[error("parse error in {path}{}: {message}", line.map_or_else(String::new, |l| format!(" (line {l})")))]
    ParseError {
        /// Path to the settings file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Settings file does not exist
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Name is not a recognized severity level
    #[error("unknown log level '{name}'{}", suggestion_suffix(suggestion.as_deref()))]
    UnknownLevel {
        /// The name that failed to parse
        name: String,
        /// Closest known level name, if any is close enough
        suggestion: Option<String>,
    },

    /// Name is not a recognized logging component
    #[error("unknown log component '{name}'{}", suggestion_suffix(suggestion.as_deref()))]
    UnknownComponent {
        /// The name that failed to parse
        name: String,
        /// Closest known component name, if any is close enough
        suggestion: Option<String>,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },
}

fn suggestion_suffix(suggestion: Option<&str>) -> String {
    suggestion.map_or_else(String::new, |s| format!(" (did you mean '{s}'?)"))
}

// ============================================================================
// Document Errors
// ============================================================================

/// Errors produced while building documents from external input.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// JSON input was not an object at the top level
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// JSON input could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON input is not valid extended JSON
    #[error("invalid extended JSON: {0}")]
    ExtJson(#[from] bson::extjson::de::Error),
}
