//! `driverlog levels`: effective ceilings per component.

use driverlog_core::{Component, Level};

use crate::cli::args::{LevelsArgs, OutputFormat};
use crate::config::LogSettings;
use crate::error::DriverLogError;
use crate::filter;

/// Print each known component's ceiling.
///
/// # Errors
///
/// Returns an error if the settings file cannot be loaded or applied.
pub fn run(args: &LevelsArgs) -> Result<(), DriverLogError> {
    if let Some(path) = &args.config {
        LogSettings::load(path)?.apply()?;
    }

    let rows: Vec<(&str, Level)> = Component::KNOWN
        .iter()
        .filter_map(|c| c.name().map(|name| (name, filter::max_level(*c))))
        .collect();

    match args.format {
        OutputFormat::Human => {
            for (name, level) in &rows {
                println!("{name:<16} {level}");
            }
        }
        OutputFormat::Json => {
            let map: serde_json::Map<String, serde_json::Value> = rows
                .iter()
                .map(|(name, level)| ((*name).to_string(), serde_json::Value::from(level.name())))
                .collect();
            println!("{}", serde_json::to_string(&map)?);
        }
    }
    Ok(())
}
