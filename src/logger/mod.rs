//! Logger construction.
//!
//! # Data Flow
//! ```text
//! LogConfig
//!     → handle.rs (Logger::build: validate, open sinks, build sampler)
//!         → sink.rs (stdout / stderr / append-mode files)
//!         → sampler.rs (per-message budget per second)
//!         → encoder.rs (tracing layer rendering JSON or console lines)
//!     → factory.rs (resolve config, build, tag with `context`)
//! ```
//!
//! # Design Decisions
//! - Each logger owns its own `tracing::Dispatch`; there is no global subscriber
//! - Derived loggers share sinks and sampler with their parent
//! - The level threshold is exact: `fatal` filters out `error` records

pub mod encoder;
pub mod factory;
pub mod handle;
pub mod sampler;
pub mod sink;

pub use factory::{new_for_context, LoggerFactory};
pub use handle::{ContextField, Logger, CONTEXT_KEY};
