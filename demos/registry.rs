//! Builds a registry from the environment and logs through it.
//!
//! ```text
//! LOGGER_LEVEL=debug cargo run --example registry
//! LOGGER_CFG_PATH=./logger.yaml cargo run --example registry
//! ```

use context_logger::{LoggerFactory, Registry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // The crate's own diagnostics go to the global subscriber.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "context_logger=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let factory = LoggerFactory::from_env();
    let registry = Registry::new(&factory, ["http", "storage"])?;

    let http = registry.get("http");
    http.info("listening");
    http.with("path", "/health").named("probe").debug("request served");

    registry.get("storage").in_scope(|| {
        tracing::warn!(table = "orders", "compaction is behind");
    });

    registry.set("http", factory.new_for_context("http-v2")?);
    registry.get("http").info("replaced");

    registry.get("http").sync()?;
    Ok(())
}
