//! Record encoding layer.
//!
//! `RecordLayer` is the only layer in each logger's subscriber. It applies
//! the exact severity threshold and sampling, renders the record with the
//! configured keys and writes it to every output sink.

use std::backtrace::Backtrace;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::config::level::Severity;
use crate::config::schema::{Encoding, LogConfig};
use crate::logger::handle::CONTEXT_KEY;
use crate::logger::sampler::Sampler;
use crate::logger::sink::SinkSet;

/// Field carrying an explicit [`Severity`] on events emitted by `Logger`.
pub(crate) const SEVERITY_FIELD: &str = "severity";
/// Field carrying the `Logger` call site.
pub(crate) const CALLER_FIELD: &str = "caller";

/// State shared by a logger and everything derived from it.
#[derive(Debug)]
pub(crate) struct Core {
    pub(crate) config: LogConfig,
    pub(crate) sinks: SinkSet,
    pub(crate) error_sinks: SinkSet,
    pub(crate) sampler: Option<Sampler>,
}

impl Core {
    fn stacktrace_from(&self) -> Severity {
        if self.config.development {
            Severity::Warn
        } else {
            Severity::Error
        }
    }

    fn write(&self, line: &str) {
        for (sink, e) in self.sinks.write_all(line.as_bytes()) {
            let report = format!(
                "{} write error on sink {}: {}\n",
                Utc::now().to_rfc3339(),
                sink,
                e
            );
            // Nowhere left to report a failing error sink.
            let _ = self.error_sinks.write_all(report.as_bytes());
        }
    }
}

/// Per-logger tracing layer.
pub(crate) struct RecordLayer {
    core: Arc<Core>,
    name: Option<Arc<str>>,
    tags: Arc<[(String, Value)]>,
}

impl RecordLayer {
    pub(crate) fn new(core: Arc<Core>, name: Option<Arc<str>>, tags: Arc<[(String, Value)]>) -> Self {
        Self { core, name, tags }
    }
}

impl<S: Subscriber> Layer<S> for RecordLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let severity = visitor
            .severity
            .unwrap_or_else(|| Severity::from_tracing(metadata.level()));
        if severity < self.core.config.level {
            return;
        }

        let message = visitor.message.unwrap_or_default();
        if let Some(sampler) = &self.core.sampler {
            if !sampler.admit(severity, &message) {
                return;
            }
        }

        let caller = visitor.caller.or_else(|| {
            metadata
                .file()
                .map(|file| format!("{}:{}", file, metadata.line().unwrap_or_default()))
        });
        let stacktrace = (!self.core.config.disable_stacktrace && severity >= self.core.stacktrace_from())
            .then(|| Backtrace::force_capture().to_string());

        let record = Record {
            severity,
            name: self.name.as_deref(),
            caller: caller.filter(|_| !self.core.config.disable_caller),
            message,
            tags: &self.tags,
            fields: visitor.fields,
            stacktrace,
        };
        self.core.write(&record.encode(&self.core.config));
    }
}

/// One rendered log record.
struct Record<'a> {
    severity: Severity,
    name: Option<&'a str>,
    caller: Option<String>,
    message: String,
    tags: &'a [(String, Value)],
    fields: Vec<(String, Value)>,
    stacktrace: Option<String>,
}

impl Record<'_> {
    fn encode(self, config: &LogConfig) -> String {
        let keys = &config.encoder_config;
        let time = keys.time_encoder.encode(Utc::now());
        let level = keys.level_encoder.encode(self.severity);

        let mut header: Vec<(&str, Value)> = Vec::with_capacity(5);
        if !keys.time_key.is_empty() {
            header.push((keys.time_key.as_str(), time));
        }
        if !keys.level_key.is_empty() {
            header.push((keys.level_key.as_str(), Value::from(level)));
        }
        if let (false, Some(name)) = (keys.name_key.is_empty(), self.name) {
            header.push((keys.name_key.as_str(), Value::from(name)));
        }
        if let (false, Some(caller)) = (keys.caller_key.is_empty(), self.caller) {
            header.push((keys.caller_key.as_str(), Value::from(caller)));
        }
        if !keys.message_key.is_empty() {
            header.push((keys.message_key.as_str(), Value::from(self.message)));
        }

        // A logger's own context outranks any `context` arriving as a field.
        let pinned = self.tags.iter().any(|(k, _)| k == CONTEXT_KEY);
        let unpinned = |(k, _): &(&str, Value)| !(pinned && *k == CONTEXT_KEY);
        let fields = config
            .initial_fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .filter(unpinned)
            .chain(self.tags.iter().map(|(k, v)| (k.as_str(), v.clone())))
            .chain(
                self.fields
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.clone()))
                    .filter(unpinned),
            );
        let stacktrace = self
            .stacktrace
            .filter(|_| !keys.stacktrace_key.is_empty())
            .map(|trace| (keys.stacktrace_key.as_str(), trace));

        let mut out = match config.encoding {
            Encoding::Json => {
                let mut object = json_map(header, fields);
                if let Some((key, trace)) = stacktrace {
                    object.insert(key.to_string(), Value::from(trace));
                }
                Value::Object(object).to_string()
            }
            Encoding::Console => {
                let mut columns: Vec<String> = header
                    .into_iter()
                    .map(|(_, value)| match value {
                        Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect();
                let fields = json_map(Vec::new(), fields);
                if !fields.is_empty() {
                    columns.push(Value::Object(fields).to_string());
                }
                let mut line = columns.join("\t");
                if let Some((_, trace)) = stacktrace {
                    line.push('\n');
                    line.push_str(&trace);
                }
                line
            }
        };
        out.push_str(&keys.line_ending);
        out
    }
}

/// Collect `reserved` entries, then `fields`, into an insertion-ordered object.
///
/// Each key appears once. Fields never replace a reserved entry; a repeated
/// field keeps its first position and takes the last value.
fn json_map<'a>(
    reserved: Vec<(&'a str, Value)>,
    fields: impl IntoIterator<Item = (&'a str, Value)>,
) -> Map<String, Value> {
    let reserved_keys: Vec<&str> = reserved.iter().map(|(k, _)| *k).collect();
    let mut object: Map<String, Value> = reserved
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    for (key, value) in fields {
        if !reserved_keys.contains(&key) {
            object.insert(key.to_string(), value);
        }
    }
    object
}

/// Splits event fields into message, severity, caller and the rest.
#[derive(Default)]
struct RecordVisitor {
    message: Option<String>,
    severity: Option<Severity>,
    caller: Option<String>,
    fields: Vec<(String, Value)>,
}

impl RecordVisitor {
    fn record_value(&mut self, field: &Field, value: Value) {
        self.fields.push((field.name().to_string(), value));
    }
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            SEVERITY_FIELD => self.severity = value.parse().ok(),
            CALLER_FIELD => self.caller = Some(value.to_string()),
            _ => self.record_value(field, Value::from(value)),
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_value(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_str(field, &format!("{:?}", value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_TAGS: &[(String, Value)] = &[];

    fn record(message: &str) -> Record<'static> {
        Record {
            severity: Severity::Warn,
            name: Some("http.server"),
            caller: Some("src/main.rs:10".to_string()),
            message: message.to_string(),
            tags: NO_TAGS,
            fields: vec![("attempt".to_string(), Value::from(3))],
            stacktrace: None,
        }
    }

    #[test]
    fn test_json_record_uses_configured_keys() {
        let mut config = LogConfig::production();
        config.encoder_config.message_key = "message".into();
        config.encoder_config.time_key = String::new();

        let line = record("retrying").encode(&config);
        assert!(line.ends_with('\n'));
        assert_eq!(
            line.trim_end(),
            r#"{"level":"warn","logger":"http.server","caller":"src/main.rs:10","message":"retrying","attempt":3}"#
        );
    }

    #[test]
    fn test_console_record() {
        let mut config = LogConfig::development();
        config.encoder_config.time_key = String::new();

        let line = record("retrying").encode(&config);
        assert_eq!(line, "WARN\thttp.server\tsrc/main.rs:10\tretrying\t{\"attempt\":3}\n");
    }

    #[test]
    fn test_json_map_escapes_keys() {
        let out = Value::Object(json_map(vec![("a\"b", Value::from("x\ny"))], [])).to_string();
        assert_eq!(out, r#"{"a\"b":"x\ny"}"#);
    }

    #[test]
    fn test_json_record_never_repeats_a_key() {
        let config = LogConfig::production();
        let mut record = record("retrying");
        record.fields = vec![
            ("level".to_string(), Value::from("spoofed")),
            ("attempt".to_string(), Value::from(3)),
            ("attempt".to_string(), Value::from(4)),
        ];

        let line = record.encode(&config);
        let parsed: Map<String, Value> = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["level"], "warn");
        assert_eq!(parsed["attempt"], 4);
        assert_eq!(line.matches("\"attempt\"").count(), 1);
        assert_eq!(line.matches("\"level\"").count(), 1);
    }

    #[test]
    fn test_pinned_context_outranks_fields() {
        let mut config = LogConfig::production();
        config
            .initial_fields
            .insert("context".to_string(), Value::from("from-file"));
        let tags = vec![("context".to_string(), Value::from("api"))];
        let mut record = record("retrying");
        record.tags = tags.as_slice();
        record.fields = vec![("context".to_string(), Value::from("from-event"))];

        let line = record.encode(&config);
        assert_eq!(line.matches("\"context\"").count(), 1);
        let parsed: Map<String, Value> = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["context"], "api");
    }
}
