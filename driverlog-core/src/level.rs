//! Severity levels and logging components.
//!
//! Levels follow syslog ordering: the numeric value grows as severity
//! decreases, so `Emergency` is 0 and `Trace` is 8. A message passes a
//! ceiling when `level <= ceiling`.
//!
//! Components are identified by a stable integer code so that ceilings can
//! be stored for components this build does not know by name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;

// ============================================================================
// Level
// ============================================================================

/// Severity of a structured log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Informational = 6,
    Debug = 7,
    Trace = 8,
}

/// Alternate spellings accepted by [`Level::from_name`].
const LEVEL_ALIASES: [(&str, Level); 3] = [
    ("off", Level::Emergency),
    ("warn", Level::Warning),
    ("info", Level::Informational),
];

impl Level {
    /// Every level, most severe first.
    pub const ALL: [Self; 9] = [
        Self::Emergency,
        Self::Alert,
        Self::Critical,
        Self::Error,
        Self::Warning,
        Self::Notice,
        Self::Informational,
        Self::Debug,
        Self::Trace,
    ];

    /// Converts a raw level number back into a `Level`.
    ///
    /// Returns `None` for values with no defined level.
    #[must_use]
    pub const fn from_repr(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Emergency),
            1 => Some(Self::Alert),
            2 => Some(Self::Critical),
            3 => Some(Self::Error),
            4 => Some(Self::Warning),
            5 => Some(Self::Notice),
            6 => Some(Self::Informational),
            7 => Some(Self::Debug),
            8 => Some(Self::Trace),
            _ => None,
        }
    }

    /// Returns the raw level number.
    #[must_use]
    pub const fn as_repr(self) -> u8 {
        self as u8
    }

    /// Canonical name of this level.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Emergency => "Emergency",
            Self::Alert => "Alert",
            Self::Critical => "Critical",
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Notice => "Notice",
            Self::Informational => "Informational",
            Self::Debug => "Debug",
            Self::Trace => "Trace",
        }
    }

    /// Canonical name for a raw level number, or `None` if it has none.
    #[must_use]
    pub fn name_of_repr(value: u8) -> Option<&'static str> {
        Self::from_repr(value).map(Self::name)
    }

    /// Case-insensitive lookup by canonical name or alias.
    ///
    /// Unrecognized names return `None`; they are never an error here.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|level| level.name().eq_ignore_ascii_case(name))
            .or_else(|| {
                LEVEL_ALIASES
                    .iter()
                    .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
                    .map(|(_, level)| *level)
            })
    }

    /// Suggests the closest level name for typo correction.
    ///
    /// Returns the closest match if its Damerau-Levenshtein distance is ≤ 3.
    #[must_use]
    pub fn suggest(input: &str) -> Option<String> {
        let input = input.to_ascii_lowercase();
        Self::ALL
            .iter()
            .map(|level| level.name())
            .chain(LEVEL_ALIASES.iter().map(|(alias, _)| *alias))
            .map(|name| (name, strsim::damerau_levenshtein(&input, &name.to_ascii_lowercase())))
            .filter(|(_, dist)| *dist <= 3)
            .min_by_key(|(_, dist)| *dist)
            .map(|(name, _)| name.to_string())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s.trim()).ok_or_else(|| ConfigError::UnknownLevel {
            name: s.to_string(),
            suggestion: Self::suggest(s.trim()),
        })
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Component
// ============================================================================

/// A logging component, identified by a stable integer code.
///
/// The four components this crate knows by name are available as
/// associated constants. Any other code is still a valid component: it can
/// carry its own ceiling and is affected by "set all" operations, but has
/// no canonical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Component(u32);

const COMPONENT_NAMES: [&str; 4] = ["command", "topology", "serverSelection", "connection"];

impl Component {
    pub const COMMAND: Self = Self(0);
    pub const TOPOLOGY: Self = Self(1);
    pub const SERVER_SELECTION: Self = Self(2);
    pub const CONNECTION: Self = Self(3);

    /// Components with a canonical name, in code order.
    pub const KNOWN: [Self; 4] = [
        Self::COMMAND,
        Self::TOPOLOGY,
        Self::SERVER_SELECTION,
        Self::CONNECTION,
    ];

    /// Wraps a raw component code.
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        Self(code)
    }

    /// Returns the raw component code.
    #[must_use]
    pub const fn code(self) -> u32 {
        self.0
    }

    /// Index into a table of known components, if this is one.
    #[must_use]
    pub const fn known_index(self) -> Option<usize> {
        if (self.0 as usize) < COMPONENT_NAMES.len() {
            Some(self.0 as usize)
        } else {
            None
        }
    }

    /// Canonical name, or `None` for components without one.
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        self.known_index().map(|i| COMPONENT_NAMES[i])
    }

    /// Case-insensitive lookup by canonical name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::KNOWN
            .iter()
            .copied()
            .find(|c| c.name().is_some_and(|n| n.eq_ignore_ascii_case(name)))
    }

    /// Suggests the closest component name for typo correction.
    #[must_use]
    pub fn suggest(input: &str) -> Option<String> {
        let input = input.to_ascii_lowercase();
        COMPONENT_NAMES
            .iter()
            .map(|name| (*name, strsim::damerau_levenshtein(&input, &name.to_ascii_lowercase())))
            .filter(|(_, dist)| *dist <= 3)
            .min_by_key(|(_, dist)| *dist)
            .map(|(name, _)| name.to_string())
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "component#{}", self.0),
        }
    }
}

impl FromStr for Component {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s.trim()).ok_or_else(|| ConfigError::UnknownComponent {
            name: s.to_string(),
            suggestion: Self::suggest(s.trim()),
        })
    }
}
