//! The per-client hub that owns monitoring callbacks and logging settings.
//!
//! A [`LogAndMonitorInstance`] pairs an APM callback record with an
//! installed [`StructuredLogInstance`]. Every change to either assigns the
//! instance a new process-unique [`Serial`], so consumers that cache
//! anything derived from the registration (for example "did we already
//! announce this topology?") can tell when it has gone stale.
//!
//! Reconfiguration takes `&mut self`: it must not race with emission.
//! Emission takes `&self` and may happen from any thread. The APM record
//! sits behind a mutex so callbacks fired from background monitors are
//! serialized with each other.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use driverlog_core::{Component, Level};

use crate::apm::{ApmCallbacks, ApmContext};
use crate::field::Field;
use crate::log::{StructuredLogInstance, StructuredLogOpts};
use crate::observability::metrics;

/// Identifies one registration state of one instance. Never zero.
pub type Serial = u64;

static SERIAL_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Issues the next process-wide serial.
///
/// # Panics
///
/// Panics if the 64-bit counter wraps, which would otherwise reissue zero.
fn next_serial() -> Serial {
    let serial = SERIAL_COUNTER.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
    assert_ne!(serial, 0, "log-and-monitor serial counter wrapped");
    serial
}

#[derive(Default)]
struct ApmRegistration {
    callbacks: ApmCallbacks,
    context: Option<ApmContext>,
}

/// APM callbacks plus structured logging for one client or pool.
pub struct LogAndMonitorInstance {
    apm: Mutex<ApmRegistration>,
    structured_log: StructuredLogInstance,
    serial: Serial,
}

impl LogAndMonitorInstance {
    /// Creates an instance with no callbacks and default logging options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_structured_log_opts(&StructuredLogOpts::new())
    }

    #[must_use]
    pub fn with_structured_log_opts(opts: &StructuredLogOpts) -> Self {
        let instance = Self {
            apm: Mutex::new(ApmRegistration::default()),
            structured_log: StructuredLogInstance::new(opts),
            serial: next_serial(),
        };
        tracing::trace!(serial = instance.serial, "log-and-monitor instance created");
        instance
    }

    /// Current registration serial.
    #[must_use]
    pub const fn serial(&self) -> Serial {
        self.serial
    }

    /// Replaces the APM callback record and its context.
    ///
    /// `None` clears every callback. The record is copied; the caller keeps
    /// ownership of `callbacks`.
    pub fn set_apm_callbacks(&mut self, callbacks: Option<&ApmCallbacks>, context: Option<ApmContext>) {
        let registration = self.apm.get_mut().unwrap_or_else(PoisonError::into_inner);
        registration.callbacks = callbacks.cloned().unwrap_or_default();
        registration.context = context;
        self.registration_changed("apm");
    }

    /// Installs a fresh structured log instance built from `opts`.
    pub fn set_structured_log_opts(&mut self, opts: &StructuredLogOpts) {
        self.structured_log = StructuredLogInstance::new(opts);
        self.registration_changed("structured_log");
    }

    fn registration_changed(&mut self, kind: &'static str) {
        let previous = self.serial;
        self.serial = next_serial();
        metrics::record_registration_change(kind);
        tracing::debug!(previous, serial = self.serial, kind, "log-and-monitor registration changed");
    }

    #[must_use]
    pub const fn structured_log(&self) -> &StructuredLogInstance {
        &self.structured_log
    }

    /// Runs `f` with the callback record held locked.
    ///
    /// Callbacks invoked from `f` must not re-enter this instance.
    pub fn with_apm<R>(&self, f: impl FnOnce(&ApmCallbacks, Option<&ApmContext>) -> R) -> R {
        let registration = self.apm.lock().unwrap_or_else(PoisonError::into_inner);
        f(&registration.callbacks, registration.context.as_ref())
    }

    /// True if any APM callback is registered.
    #[must_use]
    pub fn has_apm_callbacks(&self) -> bool {
        self.with_apm(|callbacks, _| !callbacks.is_empty())
    }

    /// Shorthand for `self.structured_log().dispatch(..)`.
    pub fn log(&self, level: Level, component: Component, message: &str, fields: &[Field<'_>]) {
        self.structured_log.dispatch(level, component, message, fields);
    }
}

impl Default for LogAndMonitorInstance {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LogAndMonitorInstance {
    fn drop(&mut self) {
        tracing::trace!(serial = self.serial, "log-and-monitor instance destroyed");
    }
}

impl fmt::Debug for LogAndMonitorInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogAndMonitorInstance")
            .field("serial", &self.serial)
            .field("structured_log", &self.structured_log)
            .finish_non_exhaustive()
    }
}
