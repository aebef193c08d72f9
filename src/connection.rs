//! Connection lifecycle events.

use driverlog_core::{Component, Level};

use crate::field::Field;
use crate::monitor::LogAndMonitorInstance;
use crate::structured_log;

pub const KEY_DRIVER_NAME: &str = "driverName";
pub const KEY_DRIVER_VERSION: &str = "driverVersion";

pub const MSG_CLIENT_CREATED: &str = "Client created";

/// Name reported in `driverName`.
pub const DRIVER_NAME: &str = env!("CARGO_PKG_NAME");
/// Version reported in `driverVersion`.
pub const DRIVER_VERSION: &str = env!("CARGO_PKG_VERSION");

impl LogAndMonitorInstance {
    /// Announces a new client on the `connection` component.
    ///
    /// There is no APM callback for this event.
    pub fn client_created(&self) {
        structured_log!(
            self.structured_log(),
            Level::Debug,
            Component::CONNECTION,
            MSG_CLIENT_CREATED,
            Field::utf8(KEY_DRIVER_NAME, DRIVER_NAME),
            Field::utf8(KEY_DRIVER_VERSION, DRIVER_VERSION),
        );
    }
}
