//! Structured log dispatch.
//!
//! [`StructuredLogOpts`] is a mutable bag of settings. It is turned into an
//! immutable [`StructuredLogInstance`] when installed on a
//! [`LogAndMonitorInstance`](crate::monitor::LogAndMonitorInstance), so the
//! hot path never needs a lock.
//!
//! Emission is filtered before anything else happens: a disabled message
//! costs one atomic load and never evaluates its fields. The
//! [`structured_log!`](crate::structured_log) macro is the intended entry
//! point for that reason.

use std::fmt;
use std::sync::Arc;

use driverlog_core::{Component, Level, MaxDocumentLength};

use crate::entry::{Entry, Envelope};
use crate::field::Field;
use crate::filter;
use crate::handler::{LogTarget, StreamHandler};
use crate::observability::metrics;

/// Destination for log file output. `stdout`, `stderr`, or a file path.
pub const ENV_LOG_PATH: &str = "MONGODB_LOG_PATH";

/// Limit on JSON renderings of documents. A number or `unlimited`.
pub const ENV_MAX_DOCUMENT_LENGTH: &str = "MONGODB_LOG_MAX_DOCUMENT_LENGTH";

/// Receives every entry that passes the filter.
///
/// Handlers may be called concurrently from any thread and must not
/// retain the entry past the call.
pub trait StructuredLogHandler: Send + Sync {
    fn handle(&self, entry: &Entry<'_>);
}

impl<F> StructuredLogHandler for F
where
    F: Fn(&Entry<'_>) + Send + Sync,
{
    fn handle(&self, entry: &Entry<'_>) {
        self(entry);
    }
}

pub type SharedHandler = Arc<dyn StructuredLogHandler>;

// ============================================================================
// Options
// ============================================================================

/// Settings for a structured log instance.
///
/// A fresh value reads [`ENV_LOG_PATH`] and [`ENV_MAX_DOCUMENT_LENGTH`] and
/// installs a [`StreamHandler`] writing JSON lines to the chosen target.
#[derive(Clone)]
pub struct StructuredLogOpts {
    handler: Option<SharedHandler>,
    max_document_length: MaxDocumentLength,
}

impl StructuredLogOpts {
    #[must_use]
    pub fn new() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`new`](Self::new), reading variables through `lookup`.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let target = LogTarget::from_setting(lookup(ENV_LOG_PATH).as_deref());
        let max_document_length = lookup(ENV_MAX_DOCUMENT_LENGTH)
            .and_then(|value| match value.parse::<MaxDocumentLength>() {
                Ok(limit) => Some(limit),
                Err(e) => {
                    tracing::warn!(
                        variable = ENV_MAX_DOCUMENT_LENGTH,
                        error = %e,
                        "ignoring invalid document length limit"
                    );
                    None
                }
            })
            .unwrap_or_default();
        Self {
            handler: Some(Arc::new(StreamHandler::new(target))),
            max_document_length,
        }
    }

    /// Replaces the handler; `None` disables output entirely.
    pub fn set_handler(&mut self, handler: Option<SharedHandler>) -> &mut Self {
        self.handler = handler;
        self
    }

    #[must_use]
    pub fn with_handler<H>(mut self, handler: H) -> Self
    where
        H: StructuredLogHandler + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn without_handler(mut self) -> Self {
        self.handler = None;
        self
    }

    pub fn set_max_document_length(&mut self, limit: MaxDocumentLength) -> &mut Self {
        self.max_document_length = limit;
        self
    }

    #[must_use]
    pub const fn max_document_length(&self) -> MaxDocumentLength {
        self.max_document_length
    }

    #[must_use]
    pub const fn handler(&self) -> Option<&SharedHandler> {
        self.handler.as_ref()
    }
}

impl Default for StructuredLogOpts {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StructuredLogOpts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuredLogOpts")
            .field("handler", &self.handler.is_some())
            .field("max_document_length", &self.max_document_length)
            .finish()
    }
}

// ============================================================================
// Instance
// ============================================================================

/// An installed, immutable structured log configuration.
#[derive(Clone)]
pub struct StructuredLogInstance {
    handler: Option<SharedHandler>,
    max_document_length: MaxDocumentLength,
}

impl StructuredLogInstance {
    #[must_use]
    pub fn new(opts: &StructuredLogOpts) -> Self {
        Self {
            handler: opts.handler.clone(),
            max_document_length: opts.max_document_length,
        }
    }

    /// An instance with no handler; nothing is ever logged.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            handler: None,
            max_document_length: MaxDocumentLength::Limited(MaxDocumentLength::DEFAULT_LIMIT),
        }
    }

    /// True if a message at `level` for `component` would reach a handler.
    #[inline]
    #[must_use]
    pub fn should_log(&self, level: Level, component: Component) -> bool {
        self.handler.is_some() && filter::should_log(component, level)
    }

    /// Filters, then hands the message to the handler.
    pub fn dispatch(&self, level: Level, component: Component, message: &str, fields: &[Field<'_>]) {
        if self.should_log(level, component) {
            self.dispatch_unfiltered(level, component, message, fields);
        }
    }

    /// Hands the message to the handler without consulting the filter.
    ///
    /// Used by [`structured_log!`](crate::structured_log) after it has
    /// already checked [`should_log`](Self::should_log).
    #[doc(hidden)]
    pub fn dispatch_unfiltered(
        &self,
        level: Level,
        component: Component,
        message: &str,
        fields: &[Field<'_>],
    ) {
        let Some(handler) = &self.handler else {
            return;
        };
        let entry = Entry::new(
            Envelope {
                level,
                component,
                message,
            },
            fields,
        )
        .with_max_document_length(self.max_document_length);
        handler.handle(&entry);
        metrics::record_dispatched(component, level);
    }

    #[must_use]
    pub const fn max_document_length(&self) -> MaxDocumentLength {
        self.max_document_length
    }
}

impl fmt::Debug for StructuredLogInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuredLogInstance")
            .field("handler", &self.handler.is_some())
            .field("max_document_length", &self.max_document_length)
            .finish()
    }
}

/// Emits a structured log message if it passes the filter.
///
/// Field expressions are only evaluated when the message is enabled.
///
/// ```ignore
/// structured_log!(
///     instance.structured_log(),
///     Level::Warning,
///     Component::COMMAND,
///     "Something happened",
///     Field::utf8("detail", "value"),
/// );
/// ```
#[macro_export]
macro_rules! structured_log {
    ($instance:expr, $level:expr, $component:expr, $message:expr $(, $field:expr)* $(,)?) => {{
        let instance: &$crate::log::StructuredLogInstance = $instance;
        let level: $crate::Level = $level;
        let component: $crate::Component = $component;
        if instance.should_log(level, component) {
            instance.dispatch_unfiltered(level, component, $message, &[$($field),*]);
        }
    }};
}
