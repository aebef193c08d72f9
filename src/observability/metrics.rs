//! Counters describing pipeline activity.
//!
//! Recording is a no-op until a recorder is installed. Label values are
//! drawn from fixed sets; components without a name share one bucket.

use std::sync::OnceLock;

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use driverlog_core::{Component, Level};

use crate::error::DriverLogError;

pub const ENTRIES_DISPATCHED: &str = "driverlog_entries_dispatched_total";
pub const ENTRIES_MATERIALIZED: &str = "driverlog_entries_materialized_total";
pub const REGISTRATION_CHANGES: &str = "driverlog_registration_changes_total";

/// Label used for components without a canonical name.
const OTHER_COMPONENT: &str = "__other__";

static RECORDER: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs a process-wide Prometheus recorder and returns its handle.
///
/// Repeated calls return the handle from the first successful install.
///
/// # Errors
///
/// Returns `DriverLogError::Io` if another recorder is already installed.
pub fn install_recorder() -> Result<PrometheusHandle, DriverLogError> {
    if let Some(handle) = RECORDER.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| DriverLogError::Io(std::io::Error::other(e.to_string())))?;
    describe_metrics();
    Ok(RECORDER.get_or_init(|| handle).clone())
}

fn describe_metrics() {
    describe_counter!(
        ENTRIES_DISPATCHED,
        "Structured log entries handed to a handler"
    );
    describe_counter!(
        ENTRIES_MATERIALIZED,
        "Structured log entries materialized into documents"
    );
    describe_counter!(
        REGISTRATION_CHANGES,
        "Changes to callback or structured log registration"
    );
}

#[must_use]
pub fn component_label(component: Component) -> &'static str {
    component.name().unwrap_or(OTHER_COMPONENT)
}

pub fn record_dispatched(component: Component, level: Level) {
    counter!(
        ENTRIES_DISPATCHED,
        "component" => component_label(component),
        "level" => level.name()
    )
    .increment(1);
}

pub fn record_materialized() {
    counter!(ENTRIES_MATERIALIZED).increment(1);
}

pub fn record_registration_change(kind: &'static str) {
    counter!(REGISTRATION_CHANGES, "kind" => kind).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unnamed_components_share_a_label() {
        assert_eq!(component_label(Component::COMMAND), "command");
        assert_eq!(component_label(Component::from_code(7)), "__other__");
        assert_eq!(component_label(Component::from_code(8)), "__other__");
    }

    #[test]
    fn recording_without_recorder_is_noop() {
        record_dispatched(Component::TOPOLOGY, Level::Debug);
        record_materialized();
        record_registration_change("apm");
    }
}
