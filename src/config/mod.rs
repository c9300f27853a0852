//! Logger configuration subsystem.
//!
//! # Data Flow
//! ```text
//! LoggerSettings (LOGGER_CFG_PATH, LOGGER_LEVEL)
//!     → loader.rs (file-first resolution)
//!         → format.rs (suffix → JSON / YAML decoder)
//!         → schema.rs (LogConfig with production defaults)
//!     → validation.rs (semantic checks, run when the logger is built)
//! ```
//!
//! # Design Decisions
//! - A configured file is authoritative; the level override only applies without one
//! - All fields have defaults so a minimal file yields a complete config
//! - Resolution never returns a partial config: every failure is an explicit error

pub mod format;
pub mod level;
pub mod loader;
pub mod schema;
pub mod validation;

pub use format::{select_unmarshaller, ConfigFormat};
pub use level::Severity;
pub use loader::{default_config, load_config, resolve_config, LoggerSettings};
pub use schema::{EncoderConfig, Encoding, LevelEncoding, LogConfig, SamplingConfig, TimeEncoding};
