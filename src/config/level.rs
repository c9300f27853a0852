//! Severity levels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ordered log-importance tier.
///
/// Ordering follows importance: `Debug < Info < Warn < Error < DPanic < Panic < Fatal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    /// Logs, then panics in development mode.
    DPanic,
    /// Logs, then panics.
    Panic,
    /// Logs, then terminates the process.
    Fatal,
}

/// Returned when a level name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized level: {0:?}")]
pub struct ParseSeverityError(pub String);

impl Severity {
    pub const ALL: [Severity; 7] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::DPanic,
        Severity::Panic,
        Severity::Fatal,
    ];

    /// Lowercase level name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::DPanic => "dpanic",
            Severity::Panic => "panic",
            Severity::Fatal => "fatal",
        }
    }

    /// Uppercase level name, used by the `capital` level encoder.
    pub const fn as_capital_str(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::DPanic => "DPANIC",
            Severity::Panic => "PANIC",
            Severity::Fatal => "FATAL",
        }
    }

    /// Closest `tracing` level. Everything from `Error` up collapses onto `ERROR`.
    pub const fn tracing_level(self) -> tracing::Level {
        match self {
            Severity::Debug => tracing::Level::DEBUG,
            Severity::Info => tracing::Level::INFO,
            Severity::Warn => tracing::Level::WARN,
            _ => tracing::Level::ERROR,
        }
    }

    /// Inverse of [`Severity::tracing_level`] for events that carry no explicit severity.
    /// `TRACE` is folded into `Debug`.
    pub fn from_tracing(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::WARN => Severity::Warn,
            _ => Severity::Error,
        }
    }

    /// Parse a level taken from the environment.
    ///
    /// Absent, empty or unrecognized values resolve to `Info`; this never fails.
    pub fn from_env_text(text: Option<&str>) -> Self {
        match text {
            None | Some("") => Severity::Info,
            Some(raw) => raw.parse().unwrap_or_else(|e: ParseSeverityError| {
                tracing::warn!(error = %e, "falling back to info level");
                Severity::Info
            }),
        }
    }
}

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseSeverityError(s.to_string()))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("debug".parse::<Severity>().unwrap(), Severity::Debug);
        assert_eq!("WARN".parse::<Severity>().unwrap(), Severity::Warn);
        assert_eq!("DPanic".parse::<Severity>().unwrap(), Severity::DPanic);
        assert_eq!("fatal".parse::<Severity>().unwrap(), Severity::Fatal);
    }

    #[test]
    fn test_parse_rejects_unknown_names() {
        assert!("warning".parse::<Severity>().is_err());
        assert!("trace".parse::<Severity>().is_err());
        assert!("".parse::<Severity>().is_err());
    }

    #[test]
    fn test_env_text_falls_back_to_info() {
        assert_eq!(Severity::from_env_text(None), Severity::Info);
        assert_eq!(Severity::from_env_text(Some("")), Severity::Info);
        assert_eq!(Severity::from_env_text(Some("loud")), Severity::Info);
        assert_eq!(Severity::from_env_text(Some("error")), Severity::Error);
    }

    #[test]
    fn test_ordering() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Error < Severity::DPanic);
        assert!(Severity::Panic < Severity::Fatal);
        assert_eq!(Severity::Fatal.tracing_level(), tracing::Level::ERROR);
    }
}
