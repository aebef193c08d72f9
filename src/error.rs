//! Error types and CLI exit codes.

use thiserror::Error;

pub use driverlog_core::error::{ConfigError, DocumentError};

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for the `driverlog` CLI.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, unknown level or component)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Malformed document argument
    pub const DOCUMENT_ERROR: i32 = 4;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `driverlog` operations.
#[derive(Debug, Error)]
pub enum DriverLogError {
    /// Settings loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Document parsing error
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DriverLogError {
    /// Returns the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => ExitCode::CONFIG_ERROR,
            Self::Document(_) => ExitCode::DOCUMENT_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
            Self::Json(_) => ExitCode::ERROR,
        }
    }
}
