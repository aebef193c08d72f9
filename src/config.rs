//! Logging settings loaded from YAML.
//!
//! ```yaml
//! levels:
//!   all: warn
//!   command: debug
//! max_document_length: unlimited
//! path: stdout
//! ```
//!
//! `all` is applied before the per-component entries regardless of where
//! it appears in the file. Validation happens in full before anything is
//! applied, so a bad file never leaves the filter half-configured.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use driverlog_core::{Component, ConfigError, Level, MaxDocumentLength};

use crate::filter;
use crate::handler::{LogTarget, StreamHandler};
use crate::log::StructuredLogOpts;

/// Key under `levels` that targets every component.
pub const ALL_COMPONENTS_KEY: &str = "all";

/// Parsed settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSettings {
    /// Component name (or `all`) to ceiling.
    #[serde(default)]
    pub levels: BTreeMap<String, Level>,

    #[serde(default)]
    pub max_document_length: Option<MaxDocumentLength>,

    /// Output target for the default stream handler.
    #[serde(default)]
    pub path: Option<LogTarget>,
}

/// Validated ceilings, ready to apply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LevelPlan {
    pub all: Option<Level>,
    pub components: Vec<(Component, Level)>,
}

impl LogSettings {
    /// Reads and parses a settings file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingFile` if `path` does not exist and
    /// `ConfigError::ParseError` if it cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::MissingFile {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::ParseError {
                    path: path.to_path_buf(),
                    line: None,
                    message: e.to_string(),
                }
            }
        })?;
        let settings = Self::from_yaml_str(&raw, path)?;
        tracing::debug!(path = %path.display(), levels = settings.levels.len(), "loaded log settings");
        Ok(settings)
    }

    /// Parses settings text. `origin` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ParseError` on malformed YAML, unknown keys,
    /// unrecognized level names, or an empty document.
    pub fn from_yaml_str(yaml: &str, origin: &Path) -> Result<Self, ConfigError> {
        let yaml = yaml.strip_prefix('\u{feff}').unwrap_or(yaml);
        if yaml.trim().is_empty() {
            return Err(ConfigError::ParseError {
                path: origin.to_path_buf(),
                line: None,
                message: "settings file is empty".to_string(),
            });
        }
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            path: origin.to_path_buf(),
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        })
    }

    /// Resolves component names.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownComponent` for a name that is neither
    /// `all` nor a known component.
    pub fn level_plan(&self) -> Result<LevelPlan, ConfigError> {
        let mut plan = LevelPlan::default();
        for (name, level) in &self.levels {
            if name.eq_ignore_ascii_case(ALL_COMPONENTS_KEY) {
                plan.all = Some(*level);
            } else {
                plan.components.push((name.parse::<Component>()?, *level));
            }
        }
        Ok(plan)
    }

    /// Applies the level ceilings and builds matching structured log
    /// options.
    ///
    /// Settings absent from the file keep their environment-derived
    /// values.
    ///
    /// # Errors
    ///
    /// Returns the first validation error; nothing is applied in that case.
    pub fn apply(&self) -> Result<StructuredLogOpts, ConfigError> {
        let plan = self.level_plan()?;
        if let Some(level) = plan.all {
            filter::set_max_level_all(level);
        }
        for (component, level) in &plan.components {
            filter::set_max_level(*component, *level);
        }

        let mut opts = StructuredLogOpts::new();
        if let Some(limit) = self.max_document_length {
            opts.set_max_document_length(limit);
        }
        if let Some(target) = &self.path {
            opts = opts.with_handler(StreamHandler::new(target.clone()));
        }
        Ok(opts)
    }
}
