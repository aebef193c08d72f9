//! Internal diagnostics for `driverlog` itself.
//!
//! Distinct from the structured log pipeline: this is how the library and
//! CLI report on their own behavior, through `tracing` and `metrics`.

pub mod logging;
pub mod metrics;

pub use self::logging::{LogFormat, init_logging};
pub use self::metrics::install_recorder;
