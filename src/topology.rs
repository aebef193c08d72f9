//! Topology and server lifecycle events.
//!
//! The topology layer decides when these fire. Deferring an "opening"
//! event until a handler is installed is its job too; see
//! [`LogAndMonitorInstance::serial`].

use bson::oid::ObjectId;
use driverlog_core::{Component, Level};

use crate::apm::{ServerEvent, TopologyEvent};
use crate::field::{Field, KEY_SERVER_HOST, KEY_SERVER_PORT};
use crate::monitor::LogAndMonitorInstance;
use crate::structured_log;

pub const KEY_TOPOLOGY_ID: &str = "topologyId";

pub const MSG_TOPOLOGY_OPENING: &str = "Starting topology monitoring";
pub const MSG_TOPOLOGY_CLOSED: &str = "Stopped topology monitoring";
pub const MSG_SERVER_OPENING: &str = "Starting server monitoring";
pub const MSG_SERVER_CLOSED: &str = "Stopped server monitoring";

impl LogAndMonitorInstance {
    pub fn topology_opening(&self, topology_id: &ObjectId) {
        self.with_apm(|callbacks, context| {
            if let Some(callback) = &callbacks.topology_opening {
                callback(&TopologyEvent {
                    topology_id,
                    context,
                });
            }
        });
        structured_log!(
            self.structured_log(),
            Level::Debug,
            Component::TOPOLOGY,
            MSG_TOPOLOGY_OPENING,
            Field::oid_as_hex(KEY_TOPOLOGY_ID, topology_id),
        );
    }

    pub fn topology_closed(&self, topology_id: &ObjectId) {
        self.with_apm(|callbacks, context| {
            if let Some(callback) = &callbacks.topology_closed {
                callback(&TopologyEvent {
                    topology_id,
                    context,
                });
            }
        });
        structured_log!(
            self.structured_log(),
            Level::Debug,
            Component::TOPOLOGY,
            MSG_TOPOLOGY_CLOSED,
            Field::oid_as_hex(KEY_TOPOLOGY_ID, topology_id),
        );
    }

    pub fn server_opening(&self, topology_id: &ObjectId, host: &str, port: u16) {
        self.with_apm(|callbacks, context| {
            if let Some(callback) = &callbacks.server_opening {
                callback(&ServerEvent {
                    topology_id,
                    host,
                    port,
                    context,
                });
            }
        });
        structured_log!(
            self.structured_log(),
            Level::Debug,
            Component::TOPOLOGY,
            MSG_SERVER_OPENING,
            Field::oid_as_hex(KEY_TOPOLOGY_ID, topology_id),
            Field::utf8(KEY_SERVER_HOST, host),
            Field::int32(KEY_SERVER_PORT, i32::from(port)),
        );
    }

    pub fn server_closed(&self, topology_id: &ObjectId, host: &str, port: u16) {
        self.with_apm(|callbacks, context| {
            if let Some(callback) = &callbacks.server_closed {
                callback(&ServerEvent {
                    topology_id,
                    host,
                    port,
                    context,
                });
            }
        });
        structured_log!(
            self.structured_log(),
            Level::Debug,
            Component::TOPOLOGY,
            MSG_SERVER_CLOSED,
            Field::oid_as_hex(KEY_TOPOLOGY_ID, topology_id),
            Field::utf8(KEY_SERVER_HOST, host),
            Field::int32(KEY_SERVER_PORT, i32::from(port)),
        );
    }
}
