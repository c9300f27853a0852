//! Config file format detection.

use std::path::Path;

use crate::config::schema::LogConfig;
use crate::error::{Error, LoadError};

/// Decode strategy for a logger config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Decode raw file contents into a [`LogConfig`].
    pub fn unmarshal(self, data: &[u8]) -> Result<LogConfig, LoadError> {
        match self {
            ConfigFormat::Json => Ok(serde_json::from_slice(data)?),
            ConfigFormat::Yaml => Ok(serde_yaml::from_slice(data)?),
        }
    }
}

/// Pick the decode strategy from the path suffix, ignoring case.
///
/// `.json` selects JSON, `.yaml` and `.yml` select YAML. Anything else is
/// rejected without touching the filesystem.
pub fn select_unmarshaller(path: &Path) -> Result<ConfigFormat, Error> {
    let lower = path.to_string_lossy().to_lowercase();
    if lower.ends_with(".json") {
        Ok(ConfigFormat::Json)
    } else if lower.ends_with(".yaml") || lower.ends_with(".yml") {
        Ok(ConfigFormat::Yaml)
    } else {
        Err(Error::UnsupportedFormat {
            path: path.to_path_buf(),
        })
    }
}
