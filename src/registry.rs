//! Loggers keyed by context.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::logger::{Logger, LoggerFactory};

/// Thread-safe map from context name to [`Logger`].
///
/// One mutex guards the map; it is held only for the map access itself.
#[derive(Debug, Default)]
pub struct Registry {
    loggers: Mutex<HashMap<String, Logger>>,
}

impl Registry {
    /// Build one logger per context, in order.
    ///
    /// The first failure aborts construction and nothing built so far is kept.
    pub fn new<I, S>(factory: &LoggerFactory, contexts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut loggers = HashMap::new();
        for context in contexts {
            let context = context.as_ref();
            let logger = factory.new_for_context(context).map_err(|e| Error::Context {
                context: context.to_string(),
                source: Box::new(e),
            })?;
            loggers.insert(context.to_string(), logger);
        }
        tracing::info!(count = loggers.len(), "Logger registry populated");

        Ok(Self {
            loggers: Mutex::new(loggers),
        })
    }

    /// [`Registry::new`] with a factory configured from the environment.
    pub fn from_env<I, S>(contexts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(&LoggerFactory::from_env(), contexts)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Logger registered for `context`.
    ///
    /// # Panics
    /// If no logger was set for `context`. Callers register every context they
    /// use up front; a miss is a wiring bug.
    pub fn get(&self, context: &str) -> Logger {
        let logger = self.lock().get(context).cloned();
        match logger {
            Some(logger) => logger,
            None => panic!("no logger set for context {}", context),
        }
    }

    /// Insert or replace the logger for `context`.
    pub fn set(&self, context: impl Into<String>, logger: Logger) {
        self.lock().insert(context.into(), logger);
    }

    pub fn contains(&self, context: &str) -> bool {
        self.lock().contains_key(context)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Registered context names, sorted.
    pub fn contexts(&self) -> Vec<String> {
        let mut contexts: Vec<String> = self.lock().keys().cloned().collect();
        contexts.sort();
        contexts
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Logger>> {
        self.loggers.lock().expect("logger registry mutex poisoned")
    }
}
