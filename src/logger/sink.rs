//! Output destinations.

use std::io::{self, Write};
use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;

use crate::error::BuildError;

/// A single opened destination.
#[derive(Debug)]
enum Sink {
    Stdout,
    Stderr,
    File {
        path: String,
        appender: RollingFileAppender,
    },
}

impl Sink {
    fn open(path: &str) -> Result<Self, BuildError> {
        match path {
            "stdout" => Ok(Sink::Stdout),
            "stderr" => Ok(Sink::Stderr),
            _ => Ok(Sink::File {
                path: path.to_string(),
                appender: open_file(path)?,
            }),
        }
    }

    fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        match self {
            Sink::Stdout => io::stdout().lock().write_all(buf),
            Sink::Stderr => io::stderr().lock().write_all(buf),
            Sink::File { appender, .. } => appender.make_writer().write_all(buf),
        }
    }

    fn flush(&self) -> io::Result<()> {
        match self {
            Sink::Stdout => io::stdout().flush(),
            Sink::Stderr => io::stderr().flush(),
            Sink::File { appender, .. } => appender.make_writer().flush(),
        }
    }

    fn name(&self) -> &str {
        match self {
            Sink::Stdout => "stdout",
            Sink::Stderr => "stderr",
            Sink::File { path, .. } => path.as_str(),
        }
    }
}

/// Open `path` (optionally `file://`-prefixed) as a non-rotating append-mode file.
/// A missing parent directory is created.
fn open_file(path: &str) -> Result<RollingFileAppender, BuildError> {
    let fs_path = Path::new(path.strip_prefix("file://").unwrap_or(path));
    let file_name = fs_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| BuildError::InvalidSinkPath(path.to_string()))?;
    let dir = match fs_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .map_err(|source| BuildError::OpenSink {
            path: path.to_string(),
            source,
        })
}

/// Every destination a record is written to.
#[derive(Debug, Default)]
pub struct SinkSet {
    sinks: Vec<Sink>,
}

impl SinkSet {
    /// Open all paths. Files are created if missing and appended to.
    pub fn open<S: AsRef<str>>(paths: &[S]) -> Result<Self, BuildError> {
        let sinks = paths
            .iter()
            .map(|path| Sink::open(path.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { sinks })
    }

    /// Write `buf` to every sink. Each failing sink is reported by name; the
    /// remaining sinks are still written.
    pub fn write_all(&self, buf: &[u8]) -> Vec<(String, io::Error)> {
        self.sinks
            .iter()
            .filter_map(|sink| sink.write_all(buf).err().map(|e| (sink.name().to_string(), e)))
            .collect()
    }

    /// Flush every sink, returning the first failure.
    pub fn flush(&self) -> io::Result<()> {
        let mut first = None;
        for sink in &self.sinks {
            if let Err(e) = sink.flush() {
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}
