//! Error types for configuration resolution and logger construction.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::validation::ValidationError;

/// Errors surfaced by the resolver, the factory and the registry.
#[derive(Debug, Error)]
pub enum Error {
    /// The config file extension is not `.json`, `.yaml` or `.yml`.
    #[error("unexpected format of logger config file {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// The config file could not be read or decoded.
    #[error("failed to build logger config from provided file {}: {source}", path.display())]
    ConfigLoad {
        path: PathBuf,
        #[source]
        source: LoadError,
    },

    /// The logging engine rejected the resolved configuration.
    #[error("failed to build logger: {0}")]
    LoggerBuild(#[from] BuildError),

    /// Building the logger for one registry entry failed.
    #[error("failed to create a logger for context {context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

/// Cause of a [`Error::ConfigLoad`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("read config file error: {0}")]
    Read(#[from] std::io::Error),

    #[error("unmarshal error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unmarshal error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Cause of a [`Error::LoggerBuild`].
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid configuration: {}", join(.0))]
    Invalid(Vec<ValidationError>),

    #[error("cannot open sink {path}: {source}")]
    OpenSink {
        path: String,
        #[source]
        source: tracing_appender::rolling::InitError,
    },

    #[error("sink path has no file name: {0}")]
    InvalidSinkPath(String),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
