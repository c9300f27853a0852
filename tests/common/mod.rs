//! Shared helpers for integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tempfile::TempDir;

/// Write `contents` to `name` inside `dir` and return the full path.
pub fn write_config(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Parse every JSON line of a sink file.
#[allow(dead_code)]
pub fn read_records(path: &Path) -> Vec<Map<String, Value>> {
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|line| serde_json::from_str(line).expect("sink line is not JSON"))
        .collect()
}

/// JSON config writing unsampled records to `sink`.
#[allow(dead_code)]
pub fn sink_config(sink: &Path, level: &str) -> String {
    serde_json::json!({
        "level": level,
        "sampling": null,
        "outputPaths": [sink.to_string_lossy()],
    })
    .to_string()
}
