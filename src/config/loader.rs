//! Logger configuration resolution.
//!
//! A config file, when one is configured, is the whole story: it is decoded
//! on top of the production defaults and the level override is ignored.
//! Without a file, the production defaults are used with the level taken
//! from the override (falling back to `info`).

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::format::select_unmarshaller;
use crate::config::level::Severity;
use crate::config::schema::{LogConfig, TimeEncoding};
use crate::error::{Error, LoadError, Result};

/// Environment variable naming a JSON or YAML logger config file.
pub const CONFIG_PATH_ENV: &str = "LOGGER_CFG_PATH";

/// Environment variable holding the minimum level when no file is used.
pub const LEVEL_ENV: &str = "LOGGER_LEVEL";

/// Inputs to configuration resolution.
///
/// Captured once (usually from the environment) and passed explicitly so that
/// resolution itself never reads process state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggerSettings {
    /// Path of an external config file.
    pub config_path: Option<PathBuf>,

    /// Raw level override, parsed leniently.
    pub level: Option<String>,
}

impl LoggerSettings {
    /// Read [`CONFIG_PATH_ENV`] and [`LEVEL_ENV`] from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.is_empty());
        Self {
            config_path: non_empty(CONFIG_PATH_ENV).map(PathBuf::from),
            level: non_empty(LEVEL_ENV),
        }
    }

    /// Settings that load the given file.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: Some(path.into()),
            level: None,
        }
    }

    /// Settings that use the defaults at the given level text.
    pub fn with_level(level: impl Into<String>) -> Self {
        Self {
            config_path: None,
            level: Some(level.into()),
        }
    }
}

/// Resolve the configuration described by `settings`.
pub fn resolve_config(settings: &LoggerSettings) -> Result<LogConfig> {
    match &settings.config_path {
        Some(path) => load_config(path),
        None => Ok(default_config(settings.level.as_deref())),
    }
}

/// Production defaults with RFC3339-nano timestamps and a lenient level override.
pub fn default_config(level: Option<&str>) -> LogConfig {
    let mut config = LogConfig::production().with_level(Severity::from_env_text(level));
    config.encoder_config.time_encoder = TimeEncoding::Rfc3339Nano;
    config
}

/// Load a config file. The format is chosen before the file is read.
pub fn load_config(path: &Path) -> Result<LogConfig> {
    let format = select_unmarshaller(path)?;
    tracing::debug!(path = %path.display(), ?format, "Loading logger config");

    let load = || -> std::result::Result<LogConfig, LoadError> {
        let data = fs::read(path)?;
        format.unmarshal(&data)
    };
    load().map_err(|source| Error::ConfigLoad {
        path: path.to_path_buf(),
        source,
    })
}
