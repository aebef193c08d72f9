//! Application performance monitoring callbacks.
//!
//! An [`ApmCallbacks`] record is registered on a
//! [`LogAndMonitorInstance`](crate::monitor::LogAndMonitorInstance) together
//! with an optional opaque context. Every event handed to a callback borrows
//! its data from the emitter and is only valid for the duration of the call.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bson::Document;
use bson::oid::ObjectId;

use crate::command::CommandError;
use crate::server_description::ServerDescription;

/// Opaque application data passed back to every callback.
pub type ApmContext = Arc<dyn Any + Send + Sync>;

// ============================================================================
// Events
// ============================================================================

/// A command is about to be sent.
#[derive(Debug, Clone, Copy)]
pub struct CommandStartedEvent<'a> {
    pub command: &'a Document,
    pub database_name: &'a str,
    pub command_name: &'a str,
    pub request_id: i32,
    pub operation_id: i64,
    pub server: &'a ServerDescription,
    pub context: Option<&'a ApmContext>,
}

/// A command completed with an ok reply.
#[derive(Debug, Clone, Copy)]
pub struct CommandSucceededEvent<'a> {
    pub duration_micros: i64,
    pub reply: &'a Document,
    pub database_name: &'a str,
    pub command_name: &'a str,
    pub request_id: i32,
    pub operation_id: i64,
    pub server: &'a ServerDescription,
    pub context: Option<&'a ApmContext>,
}

/// A command failed, either on the server or before a reply arrived.
#[derive(Debug, Clone, Copy)]
pub struct CommandFailedEvent<'a> {
    pub duration_micros: i64,
    pub reply: &'a Document,
    pub error: &'a CommandError,
    pub database_name: &'a str,
    pub command_name: &'a str,
    pub request_id: i32,
    pub operation_id: i64,
    pub server: &'a ServerDescription,
    pub context: Option<&'a ApmContext>,
}

/// A topology was opened or closed.
#[derive(Debug, Clone, Copy)]
pub struct TopologyEvent<'a> {
    pub topology_id: &'a ObjectId,
    pub context: Option<&'a ApmContext>,
}

/// A server was added to or removed from a topology.
#[derive(Debug, Clone, Copy)]
pub struct ServerEvent<'a> {
    pub topology_id: &'a ObjectId,
    pub host: &'a str,
    pub port: u16,
    pub context: Option<&'a ApmContext>,
}

// ============================================================================
// Callback record
// ============================================================================

pub type CommandStartedCallback = Arc<dyn Fn(&CommandStartedEvent<'_>) + Send + Sync>;
pub type CommandSucceededCallback = Arc<dyn Fn(&CommandSucceededEvent<'_>) + Send + Sync>;
pub type CommandFailedCallback = Arc<dyn Fn(&CommandFailedEvent<'_>) + Send + Sync>;
pub type TopologyCallback = Arc<dyn Fn(&TopologyEvent<'_>) + Send + Sync>;
pub type ServerCallback = Arc<dyn Fn(&ServerEvent<'_>) + Send + Sync>;

/// The set of monitoring callbacks an application registers.
///
/// Unset slots are skipped. Callbacks run while the owning instance holds
/// its monitoring lock, so they must not call back into that instance.
#[derive(Clone, Default)]
pub struct ApmCallbacks {
    pub command_started: Option<CommandStartedCallback>,
    pub command_succeeded: Option<CommandSucceededCallback>,
    pub command_failed: Option<CommandFailedCallback>,
    pub topology_opening: Option<TopologyCallback>,
    pub topology_closed: Option<TopologyCallback>,
    pub server_opening: Option<ServerCallback>,
    pub server_closed: Option<ServerCallback>,
}

impl ApmCallbacks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_command_started<F>(mut self, f: F) -> Self
    where
        F: Fn(&CommandStartedEvent<'_>) + Send + Sync + 'static,
    {
        self.command_started = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_command_succeeded<F>(mut self, f: F) -> Self
    where
        F: Fn(&CommandSucceededEvent<'_>) + Send + Sync + 'static,
    {
        self.command_succeeded = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_command_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(&CommandFailedEvent<'_>) + Send + Sync + 'static,
    {
        self.command_failed = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_topology_opening<F>(mut self, f: F) -> Self
    where
        F: Fn(&TopologyEvent<'_>) + Send + Sync + 'static,
    {
        self.topology_opening = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_topology_closed<F>(mut self, f: F) -> Self
    where
        F: Fn(&TopologyEvent<'_>) + Send + Sync + 'static,
    {
        self.topology_closed = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_server_opening<F>(mut self, f: F) -> Self
    where
        F: Fn(&ServerEvent<'_>) + Send + Sync + 'static,
    {
        self.server_opening = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_server_closed<F>(mut self, f: F) -> Self
    where
        F: Fn(&ServerEvent<'_>) + Send + Sync + 'static,
    {
        self.server_closed = Some(Arc::new(f));
        self
    }

    /// True if no callback is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.command_started.is_none()
            && self.command_succeeded.is_none()
            && self.command_failed.is_none()
            && self.topology_opening.is_none()
            && self.topology_closed.is_none()
            && self.server_opening.is_none()
            && self.server_closed.is_none()
    }
}

// Closures are not Debug; report which slots are set.
impl fmt::Debug for ApmCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApmCallbacks")
            .field("command_started", &self.command_started.is_some())
            .field("command_succeeded", &self.command_succeeded.is_some())
            .field("command_failed", &self.command_failed.is_some())
            .field("topology_opening", &self.topology_opening.is_some())
            .field("topology_closed", &self.topology_closed.is_some())
            .field("server_opening", &self.server_opening.is_some())
            .field("server_closed", &self.server_closed.is_some())
            .finish()
    }
}
