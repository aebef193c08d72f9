//! Process-wide severity ceilings per logging component.
//!
//! The table is a global default plus per-component overrides. Known
//! components keep their override in a fixed array of atomics; components
//! this build has no name for keep theirs in a concurrent map keyed by
//! code. "Set all" rewrites the default and clears every override, so it
//! also reaches components that have never been seen.
//!
//! Reads and writes are individually atomic but not coordinated with each
//! other. A racing reader may see a slightly stale ceiling; filtering is
//! best-effort and never a correctness boundary.
//!
//! The environment is scanned once, lazily, on first use of any function
//! in this module.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{LazyLock, Once};

use dashmap::DashMap;

use driverlog_core::{Component, Level};

/// Ceiling applied to every component that has no override.
pub const DEFAULT_MAX_LEVEL: Level = Level::Warning;

/// Variable that sets every component's ceiling.
pub const ENV_LOG_ALL: &str = "MONGODB_LOG_ALL";

/// Per-component variables, applied after [`ENV_LOG_ALL`].
pub const ENV_COMPONENT_VARS: [(Component, &str); 4] = [
    (Component::COMMAND, "MONGODB_LOG_COMMAND"),
    (Component::TOPOLOGY, "MONGODB_LOG_TOPOLOGY"),
    (Component::SERVER_SELECTION, "MONGODB_LOG_SERVER_SELECTION"),
    (Component::CONNECTION, "MONGODB_LOG_CONNECTION"),
];

/// Marks a known-component slot with no override.
const UNSET: u8 = u8::MAX;

static DEFAULT_LEVEL: AtomicU8 = AtomicU8::new(DEFAULT_MAX_LEVEL as u8);
static KNOWN_LEVELS: [AtomicU8; Component::KNOWN.len()] =
    [const { AtomicU8::new(UNSET) }; Component::KNOWN.len()];
static EXTENDED_LEVELS: LazyLock<DashMap<u32, Level>> = LazyLock::new(DashMap::new);
static ENV_SCAN: Once = Once::new();

fn ensure_initialized() {
    ENV_SCAN.call_once(|| apply_levels(|name| std::env::var(name).ok()));
}

fn load_level(slot: &AtomicU8) -> Option<Level> {
    Level::from_repr(slot.load(Ordering::Relaxed))
}

fn store_level(component: Component, level: Level) {
    match component.known_index() {
        Some(i) => KNOWN_LEVELS[i].store(level.as_repr(), Ordering::Relaxed),
        None => {
            EXTENDED_LEVELS.insert(component.code(), level);
        }
    }
}

fn store_level_all(level: Level) {
    DEFAULT_LEVEL.store(level.as_repr(), Ordering::Relaxed);
    for slot in &KNOWN_LEVELS {
        slot.store(UNSET, Ordering::Relaxed);
    }
    EXTENDED_LEVELS.clear();
}

/// Returns the current ceiling for `component`.
#[must_use]
pub fn max_level(component: Component) -> Level {
    ensure_initialized();
    let own = match component.known_index() {
        Some(i) => load_level(&KNOWN_LEVELS[i]),
        None => EXTENDED_LEVELS.get(&component.code()).map(|l| *l),
    };
    own.or_else(|| load_level(&DEFAULT_LEVEL))
        .unwrap_or(DEFAULT_MAX_LEVEL)
}

/// True when a message at `level` for `component` passes the filter.
#[must_use]
pub fn should_log(component: Component, level: Level) -> bool {
    level <= max_level(component)
}

/// Sets the ceiling for one component.
pub fn set_max_level(component: Component, level: Level) {
    ensure_initialized();
    store_level(component, level);
}

/// Sets the ceiling for every component, including ones unknown to this
/// build.
pub fn set_max_level_all(level: Level) {
    ensure_initialized();
    store_level_all(level);
}

/// Applies ceilings from the process environment.
///
/// `MONGODB_LOG_ALL` is applied first, then the per-component variables.
/// Variables that are unset or hold an unrecognized level name leave the
/// current ceiling untouched.
///
/// This already happens automatically on first use. Calling it again
/// re-scans the environment, letting it override programmatic settings.
pub fn set_max_levels_from_env() {
    set_max_levels_from(|name| std::env::var(name).ok());
}

/// Like [`set_max_levels_from_env`], reading variables through `lookup`.
///
/// Counts as the initial environment scan if none has happened yet.
pub fn set_max_levels_from<F>(lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    ENV_SCAN.call_once(|| {});
    apply_levels(lookup);
}

fn apply_levels<F>(lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(level) = level_from_var(&lookup, ENV_LOG_ALL) {
        store_level_all(level);
    }
    for (component, variable) in ENV_COMPONENT_VARS {
        if let Some(level) = level_from_var(&lookup, variable) {
            store_level(component, level);
        }
    }
}

fn level_from_var<F>(lookup: &F, variable: &str) -> Option<Level>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(variable)?;
    let level = Level::from_name(value.trim());
    if level.is_none() {
        tracing::warn!(
            variable,
            value = %value,
            suggestion = Level::suggest(value.trim()).as_deref(),
            "ignoring unrecognized log level"
        );
    }
    level
}

/// Serializes unit tests that touch the global table.
#[cfg(test)]
pub(crate) fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
