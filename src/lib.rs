//! Context-tagged structured loggers.
//!
//! Resolves a logger configuration (production defaults, a level override,
//! or a JSON/YAML file), builds a logger tagged with a `context` field, and
//! keeps loggers in a thread-safe registry keyed by context.
//!
//! ```no_run
//! use context_logger::{LoggerFactory, Registry};
//!
//! let registry = Registry::new(&LoggerFactory::from_env(), ["api", "db"])?;
//! registry.get("api").info("listening");
//! # Ok::<(), context_logger::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod logger;
pub mod registry;

pub use config::{LogConfig, LoggerSettings, Severity};
pub use error::{BuildError, Error, LoadError, Result};
pub use logger::{new_for_context, ContextField, Logger, LoggerFactory};
pub use registry::Registry;
