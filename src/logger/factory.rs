//! Context-tagged logger construction.

use crate::config::loader::{resolve_config, LoggerSettings};
use crate::error::Result;
use crate::logger::handle::Logger;

/// Builds loggers from a fixed set of [`LoggerSettings`].
///
/// Every call resolves the configuration afresh, so a changed config file is
/// picked up by the next logger built. Nothing is cached.
#[derive(Debug, Clone, Default)]
pub struct LoggerFactory {
    settings: LoggerSettings,
}

impl LoggerFactory {
    pub fn new(settings: LoggerSettings) -> Self {
        Self { settings }
    }

    /// Factory configured from `LOGGER_CFG_PATH` and `LOGGER_LEVEL`.
    pub fn from_env() -> Self {
        Self::new(LoggerSettings::from_env())
    }

    pub fn settings(&self) -> &LoggerSettings {
        &self.settings
    }

    /// Build a logger whose records all carry `context = <context>`.
    ///
    /// Any string is accepted, including the empty string.
    pub fn new_for_context(&self, context: &str) -> Result<Logger> {
        let config = resolve_config(&self.settings)?;
        let logger = Logger::build(config)?;
        Ok(logger.for_context(context))
    }
}

/// [`LoggerFactory::new_for_context`] using settings read from the environment.
pub fn new_for_context(context: &str) -> Result<Logger> {
    LoggerFactory::from_env().new_for_context(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::level::Severity;
    use crate::error::Error;

    #[test]
    fn test_tags_context() {
        let factory = LoggerFactory::new(LoggerSettings::with_level("debug"));
        let logger = factory.new_for_context("billing").unwrap();
        assert_eq!(logger.context(), Some("billing"));
        assert_eq!(logger.config().level, Severity::Debug);
    }

    #[test]
    fn test_empty_and_repeated_contexts_are_legal() {
        let factory = LoggerFactory::default();
        assert_eq!(factory.new_for_context("").unwrap().context(), Some(""));
        let a = factory.new_for_context("dup").unwrap();
        let b = factory.new_for_context("dup").unwrap();
        assert_eq!(a.context(), b.context());
    }

    #[test]
    fn test_resolver_errors_propagate() {
        let factory = LoggerFactory::new(LoggerSettings::with_file("logger.ini"));
        assert!(matches!(
            factory.new_for_context("x"),
            Err(Error::UnsupportedFormat { .. })
        ));
    }
}
