//! The logger handle.

use std::fmt;
use std::io;
use std::panic::Location;
use std::sync::Arc;

use serde_json::Value;
use tracing::Dispatch;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Layer;

use crate::config::level::Severity;
use crate::config::schema::LogConfig;
use crate::config::validation::validate_config;
use crate::error::BuildError;
use crate::logger::encoder::{Core, RecordLayer};
use crate::logger::sampler::Sampler;
use crate::logger::sink::SinkSet;

/// Key of the field every factory-built logger carries.
pub const CONTEXT_KEY: &str = "context";

/// The `context` field attached to a logger at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextField(Arc<str>);

impl ContextField {
    pub fn key(&self) -> &'static str {
        CONTEXT_KEY
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

/// A ready-to-use structured logger.
///
/// Cloning is cheap and clones write to the same sinks. A handle never
/// changes after construction: [`Logger::with`] and [`Logger::named`] return
/// new handles.
#[derive(Clone)]
pub struct Logger {
    core: Arc<Core>,
    name: Option<Arc<str>>,
    context: Option<ContextField>,
    fields: Arc<[(String, Value)]>,
    dispatch: Dispatch,
}

impl Logger {
    /// Build a logger from a resolved configuration.
    ///
    /// Fails if the configuration is semantically invalid or a sink cannot be opened.
    pub fn build(config: LogConfig) -> Result<Self, BuildError> {
        validate_config(&config).map_err(BuildError::Invalid)?;

        let sinks = SinkSet::open(&config.output_paths)?;
        let error_sinks = SinkSet::open(&config.error_output_paths)?;
        let sampler = config.sampling.map(Sampler::new);

        let core = Arc::new(Core {
            config,
            sinks,
            error_sinks,
            sampler,
        });
        Ok(Self::assemble(core, None, None, Arc::from(Vec::<(String, Value)>::new())))
    }

    fn assemble(
        core: Arc<Core>,
        name: Option<Arc<str>>,
        context: Option<ContextField>,
        fields: Arc<[(String, Value)]>,
    ) -> Self {
        let tags: Arc<[(String, Value)]> = context
            .iter()
            .map(|context| (CONTEXT_KEY.to_string(), Value::from(context.value())))
            .chain(fields.iter().cloned())
            .collect();

        let filter = LevelFilter::from_level(core.config.level.tracing_level());
        let layer = RecordLayer::new(core.clone(), name.clone(), tags).with_filter(filter);
        let dispatch = Dispatch::new(tracing_subscriber::registry().with(layer));

        Self {
            core,
            name,
            context,
            fields,
            dispatch,
        }
    }

    /// Copy of this logger tagged with `context`. Replaces nothing on `self`.
    pub(crate) fn for_context(&self, context: &str) -> Self {
        Self::assemble(
            self.core.clone(),
            self.name.clone(),
            Some(ContextField(Arc::from(context))),
            self.fields.clone(),
        )
    }

    /// Derive a logger that adds `key = value` to every record.
    ///
    /// On a context-tagged logger a `context` key is ignored: the context
    /// fixed at construction is the only one its records carry.
    pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if self.context.is_some() && key == CONTEXT_KEY {
            return self.clone();
        }
        let fields: Arc<[(String, Value)]> = self
            .fields
            .iter()
            .cloned()
            .chain(std::iter::once((key, value.into())))
            .collect();
        Self::assemble(self.core.clone(), self.name.clone(), self.context.clone(), fields)
    }

    /// Derive a logger with `name` appended to the logger name, dot-separated.
    pub fn named(&self, name: &str) -> Self {
        let name: Arc<str> = match &self.name {
            Some(parent) => Arc::from(format!("{}.{}", parent, name)),
            None => Arc::from(name),
        };
        Self::assemble(self.core.clone(), Some(name), self.context.clone(), self.fields.clone())
    }

    /// The `context` this logger was built for.
    pub fn context(&self) -> Option<&str> {
        self.context.as_ref().map(ContextField::value)
    }

    pub fn context_field(&self) -> Option<&ContextField> {
        self.context.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Fields added with [`Logger::with`], oldest first.
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Configuration snapshot this logger was built from.
    pub fn config(&self) -> &LogConfig {
        &self.core.config
    }

    /// Whether records at `severity` pass the level threshold.
    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.core.config.level
    }

    /// Run `f` with this logger as the thread's default `tracing` dispatcher.
    ///
    /// Every `tracing` event on this thread inside `f` goes to this logger,
    /// including this crate's own diagnostics (a [`crate::Registry`] or
    /// factory built inside `f` reports here instead of the global subscriber).
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Flush every sink.
    pub fn sync(&self) -> io::Result<()> {
        self.core.sinks.flush()?;
        self.core.error_sinks.flush()
    }

    /// Log at `severity`, then panic or exit as `dpanic`, `panic` and `fatal` require.
    #[track_caller]
    pub fn log(&self, severity: Severity, message: &str) {
        self.emit(severity, message, Location::caller());
        match severity {
            Severity::DPanic if self.core.config.development => panic!("{}", message),
            Severity::Panic => panic!("{}", message),
            Severity::Fatal => self.exit(),
            _ => {}
        }
    }

    #[track_caller]
    pub fn debug(&self, message: &str) {
        self.log(Severity::Debug, message);
    }

    #[track_caller]
    pub fn info(&self, message: &str) {
        self.log(Severity::Info, message);
    }

    #[track_caller]
    pub fn warn(&self, message: &str) {
        self.log(Severity::Warn, message);
    }

    #[track_caller]
    pub fn error(&self, message: &str) {
        self.log(Severity::Error, message);
    }

    /// Logs; panics only in development mode.
    #[track_caller]
    pub fn dpanic(&self, message: &str) {
        self.log(Severity::DPanic, message);
    }

    #[track_caller]
    pub fn panic(&self, message: &str) -> ! {
        self.emit(Severity::Panic, message, Location::caller());
        panic!("{}", message)
    }

    /// Logs, flushes and terminates the process with status 1.
    #[track_caller]
    pub fn fatal(&self, message: &str) -> ! {
        self.emit(Severity::Fatal, message, Location::caller());
        self.exit()
    }

    fn exit(&self) -> ! {
        let _ = self.sync();
        std::process::exit(1)
    }

    fn emit(&self, severity: Severity, message: &str, location: &Location<'_>) {
        let caller = format!("{}:{}", location.file(), location.line());
        let level = severity.as_str();
        tracing::dispatcher::with_default(&self.dispatch, || match severity {
            Severity::Debug => tracing::debug!(severity = level, caller = caller.as_str(), "{}", message),
            Severity::Info => tracing::info!(severity = level, caller = caller.as_str(), "{}", message),
            Severity::Warn => tracing::warn!(severity = level, caller = caller.as_str(), "{}", message),
            _ => tracing::error!(severity = level, caller = caller.as_str(), "{}", message),
        });
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("context", &self.context())
            .field("fields", &self.fields)
            .field("level", &self.core.config.level)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::SamplingConfig;

    fn file_config(path: &std::path::Path) -> LogConfig {
        let mut config = LogConfig::production();
        config.output_paths = vec![path.to_string_lossy().to_string()];
        config.sampling = None;
        config
    }

    fn records(path: &std::path::Path) -> Vec<serde_json::Map<String, Value>> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_record_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let logger = Logger::build(file_config(&path)).unwrap().for_context("payments");

        logger.info("started");

        let records = records(&path);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record["level"], "info");
        assert_eq!(record["msg"], "started");
        assert_eq!(record["context"], "payments");
        assert!(record["caller"].as_str().unwrap().contains("handle.rs"));
        let ts = record["ts"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok(), "{}", ts);
        assert!(!record.contains_key("stacktrace"));
    }

    #[test]
    fn test_level_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let logger = Logger::build(file_config(&path).with_level(Severity::Warn)).unwrap();

        assert!(!logger.enabled(Severity::Info));
        logger.debug("dropped");
        logger.info("dropped");
        logger.warn("kept");
        logger.error("kept");
        // dpanic outside development mode only logs
        logger.dpanic("kept");

        let levels: Vec<_> = records(&path).iter().map(|r| r["level"].clone()).collect();
        assert_eq!(levels, vec!["warn", "error", "dpanic"]);
    }

    #[test]
    fn test_derived_loggers_leave_original_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let base = Logger::build(file_config(&path)).unwrap().for_context("api");
        let derived = base.with("request_id", "r-1").named("http");

        assert!(base.fields().is_empty());
        assert_eq!(base.name(), None);
        assert_eq!(derived.context(), Some("api"));
        assert_eq!(derived.name(), Some("http"));

        base.info("one");
        derived.info("two");

        let records = records(&path);
        assert!(!records[0].contains_key("request_id"));
        assert_eq!(records[1]["request_id"], "r-1");
        assert_eq!(records[1]["logger"], "http");
        assert_eq!(records[1]["context"], "api");
    }

    #[test]
    fn test_in_scope_routes_tracing_macros() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let logger = Logger::build(file_config(&path)).unwrap().for_context("worker");

        logger.in_scope(|| {
            tracing::info!(job = 7, "picked up");
            tracing::debug!("below threshold");
        });

        let records = records(&path);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["msg"], "picked up");
        assert_eq!(records[0]["job"], 7);
        assert_eq!(records[0]["context"], "worker");
    }

    #[test]
    fn test_with_cannot_replace_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let logger = Logger::build(file_config(&path)).unwrap().for_context("api");
        let derived = logger.with("context", "other").with("user", "u-1");

        assert!(derived.fields().iter().all(|(key, _)| key != CONTEXT_KEY));
        derived.info("handled");
        derived.in_scope(|| tracing::info!(context = "spoofed", "scoped"));

        let raw = std::fs::read_to_string(&path).unwrap();
        for line in raw.lines() {
            assert_eq!(line.matches("\"context\"").count(), 1, "{}", line);
        }
        let records = records(&path);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r["context"] == "api"));
        assert_eq!(records[0]["user"], "u-1");
    }

    #[test]
    fn test_in_scope_captures_crate_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let logger = Logger::build(file_config(&path).with_level(Severity::Debug)).unwrap();

        logger.in_scope(|| Severity::from_env_text(Some("loud")));

        let records = records(&path);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["level"], "warn");
        assert_eq!(records[0]["msg"], "falling back to info level");
    }

    #[test]
    fn test_sampling_limits_repeats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let mut config = file_config(&path);
        config.sampling = Some(SamplingConfig { initial: 2, thereafter: 0 });
        let logger = Logger::build(config).unwrap();

        for _ in 0..10 {
            logger.info("hot loop");
        }
        logger.info("different message");

        assert_eq!(records(&path).len(), 3);
    }

    #[test]
    fn test_error_carries_stacktrace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let logger = Logger::build(file_config(&path)).unwrap();

        logger.error("boom");

        assert!(records(&path)[0].contains_key("stacktrace"));
    }

    #[test]
    #[should_panic(expected = "unrecoverable")]
    fn test_panic_logs_then_panics() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::build(file_config(&dir.path().join("out.log"))).unwrap();
        logger.panic("unrecoverable");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = LogConfig::production();
        config.sampling = Some(SamplingConfig { initial: 0, thereafter: 1 });
        assert!(matches!(Logger::build(config), Err(BuildError::Invalid(_))));
    }
}
