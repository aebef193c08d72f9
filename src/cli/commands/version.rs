//! `driverlog version`: version plus the pipeline's built-in defaults.

use serde::Serialize;

use driverlog_core::{Component, Level, MaxDocumentLength};

use crate::cli::args::{OutputFormat, VersionArgs};
use crate::connection::{DRIVER_NAME, DRIVER_VERSION};
use crate::error::DriverLogError;
use crate::filter::DEFAULT_MAX_LEVEL;
use crate::handler::LogTarget;

#[derive(Debug, Serialize)]
struct VersionInfo {
    name: &'static str,
    version: &'static str,
    components: Vec<&'static str>,
    default_level: Level,
    default_max_document_length: MaxDocumentLength,
    default_path: String,
}

impl VersionInfo {
    fn collect() -> Self {
        Self {
            name: DRIVER_NAME,
            version: DRIVER_VERSION,
            components: Component::KNOWN.iter().filter_map(|c| c.name()).collect(),
            default_level: DEFAULT_MAX_LEVEL,
            default_max_document_length: MaxDocumentLength::default(),
            default_path: LogTarget::default().to_string(),
        }
    }
}

/// Print version information and defaults.
///
/// # Errors
///
/// Returns an error if JSON output cannot be serialized.
pub fn run(args: &VersionArgs) -> Result<(), DriverLogError> {
    let info = VersionInfo::collect();
    match args.format {
        OutputFormat::Human => {
            println!("{} {}", info.name, info.version);
            println!("components:          {}", info.components.join(", "));
            println!("default level:       {}", info.default_level);
            println!("max document length: {}", info.default_max_document_length);
            println!("log path:            {}", info.default_path);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(&info)?);
        }
    }
    Ok(())
}
