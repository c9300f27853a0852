//! Configuration schema definitions.
//!
//! Field names are camelCase on the wire so the same files that configure a
//! zap-style logger load here unchanged. Every struct carries
//! `#[serde(default)]`: a file that names only `level` still produces a
//! complete production configuration.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::level::Severity;

/// Root logger configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogConfig {
    /// Minimum severity that is emitted.
    pub level: Severity,

    /// Development mode: `dpanic` panics and stacktraces start at `warn`.
    pub development: bool,

    /// Omit the caller location from records.
    pub disable_caller: bool,

    /// Never capture stacktraces.
    pub disable_stacktrace: bool,

    /// Per-second sampling. `None` disables sampling.
    pub sampling: Option<SamplingConfig>,

    /// Record encoding.
    pub encoding: Encoding,

    /// Key names and value encoders.
    pub encoder_config: EncoderConfig,

    /// Record destinations: `stdout`, `stderr` or a file path.
    pub output_paths: Vec<String>,

    /// Destinations for the logger's own write failures.
    pub error_output_paths: Vec<String>,

    /// Fields added to every record.
    pub initial_fields: BTreeMap<String, Value>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Production preset: JSON to stderr at `info`, sampled, RFC3339-nano timestamps.
    pub fn production() -> Self {
        Self {
            level: Severity::Info,
            development: false,
            disable_caller: false,
            disable_stacktrace: false,
            sampling: Some(SamplingConfig::default()),
            encoding: Encoding::Json,
            encoder_config: EncoderConfig::default(),
            output_paths: vec!["stderr".to_string()],
            error_output_paths: vec!["stderr".to_string()],
            initial_fields: BTreeMap::new(),
        }
    }

    /// Development preset: console output at `debug`, unsampled, capital levels.
    pub fn development() -> Self {
        Self {
            level: Severity::Debug,
            development: true,
            sampling: None,
            encoding: Encoding::Console,
            encoder_config: EncoderConfig {
                level_encoder: LevelEncoding::Capital,
                time_encoder: TimeEncoding::Iso8601,
                ..EncoderConfig::default()
            },
            ..Self::production()
        }
    }

    /// Copy of this configuration with a different level.
    pub fn with_level(mut self, level: Severity) -> Self {
        self.level = level;
        self
    }
}

/// Sampling budget per `(level, message)` per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Records let through unconditionally in each window.
    pub initial: u64,

    /// After `initial`, every `thereafter`-th record passes. Zero drops the rest.
    pub thereafter: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            initial: 100,
            thereafter: 100,
        }
    }
}

/// Record encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// One JSON object per line.
    #[default]
    Json,
    /// Tab-separated human-readable line.
    Console,
}

/// Key names and value encoders used when writing records.
///
/// An empty key omits that element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EncoderConfig {
    pub message_key: String,
    pub level_key: String,
    pub time_key: String,
    pub name_key: String,
    pub caller_key: String,
    pub stacktrace_key: String,
    pub line_ending: String,
    pub level_encoder: LevelEncoding,
    pub time_encoder: TimeEncoding,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            message_key: "msg".to_string(),
            level_key: "level".to_string(),
            time_key: "ts".to_string(),
            name_key: "logger".to_string(),
            caller_key: "caller".to_string(),
            stacktrace_key: "stacktrace".to_string(),
            line_ending: "\n".to_string(),
            level_encoder: LevelEncoding::Lowercase,
            time_encoder: TimeEncoding::Rfc3339Nano,
        }
    }
}

impl EncoderConfig {
    /// Non-empty keys, in record order.
    pub(crate) fn keys(&self) -> impl Iterator<Item = &str> {
        [
            self.time_key.as_str(),
            self.level_key.as_str(),
            self.name_key.as_str(),
            self.caller_key.as_str(),
            self.message_key.as_str(),
            self.stacktrace_key.as_str(),
        ]
        .into_iter()
        .filter(|key| !key.is_empty())
    }
}

/// How the level is rendered. Unknown names fall back to `lowercase`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(from = "String", rename_all = "lowercase")]
pub enum LevelEncoding {
    #[default]
    Lowercase,
    Capital,
}

impl From<String> for LevelEncoding {
    fn from(raw: String) -> Self {
        if raw.to_ascii_lowercase().starts_with("capital") {
            LevelEncoding::Capital
        } else {
            LevelEncoding::Lowercase
        }
    }
}

impl LevelEncoding {
    pub fn encode(self, level: Severity) -> &'static str {
        match self {
            LevelEncoding::Lowercase => level.as_str(),
            LevelEncoding::Capital => level.as_capital_str(),
        }
    }
}

/// How timestamps are rendered. Unknown names fall back to `epoch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(from = "String", rename_all = "lowercase")]
pub enum TimeEncoding {
    /// `2024-05-01T12:00:00.123456789Z`
    #[default]
    Rfc3339Nano,
    /// `2024-05-01T12:00:00Z`
    Rfc3339,
    /// `2024-05-01T12:00:00.123+0000`
    Iso8601,
    /// Floating-point seconds since the Unix epoch.
    Epoch,
    /// Floating-point milliseconds since the Unix epoch.
    Millis,
    /// Integer nanoseconds since the Unix epoch.
    Nanos,
}

impl From<String> for TimeEncoding {
    fn from(raw: String) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "rfc3339nano" => TimeEncoding::Rfc3339Nano,
            "rfc3339" => TimeEncoding::Rfc3339,
            "iso8601" => TimeEncoding::Iso8601,
            "millis" => TimeEncoding::Millis,
            "nanos" => TimeEncoding::Nanos,
            _ => TimeEncoding::Epoch,
        }
    }
}

impl TimeEncoding {
    pub fn encode(self, at: DateTime<Utc>) -> Value {
        let nanos = at.timestamp_nanos_opt().unwrap_or_default();
        match self {
            TimeEncoding::Rfc3339Nano => Value::from(at.to_rfc3339_opts(SecondsFormat::Nanos, true)),
            TimeEncoding::Rfc3339 => Value::from(at.to_rfc3339_opts(SecondsFormat::Secs, true)),
            TimeEncoding::Iso8601 => Value::from(at.format("%Y-%m-%dT%H:%M:%S%.3f%z").to_string()),
            TimeEncoding::Epoch => Value::from(nanos as f64 / 1e9),
            TimeEncoding::Millis => Value::from(nanos as f64 / 1e6),
            TimeEncoding::Nanos => Value::from(nanos),
        }
    }
}
