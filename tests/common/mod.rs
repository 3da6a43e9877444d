//! Common test utilities for docquery integration tests
//!
//! Provides shared helpers for:
//! - Building records and record sources from JSON
//! - Laying out document trees in temp directories

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use docquery::{InMemoryRecordSource, Record};
use serde_json::json;
use tempfile::TempDir;

pub fn records(values: Vec<serde_json::Value>) -> Vec<Record> {
    values
        .into_iter()
        .map(|v| Record::try_from(v).expect("record must be a JSON object"))
        .collect()
}

pub fn seeded_source() -> InMemoryRecordSource {
    InMemoryRecordSource::from_json(json!({
        "page": [
            {"name": "Proj A", "tags": ["work", "x"]},
            {"name": "X", "tags": "x"},
            {"name": "Proj B", "tags": ["home"]},
            {"name": "Proj C"}
        ],
        "task": [
            {"name": "write", "done": false, "priority": 2},
            {"name": "test", "done": true, "priority": 1},
            {"name": "ship", "done": false, "priority": 2}
        ]
    }))
    .expect("seed data is well formed")
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    std::fs::write(&path, content).expect("Failed to write file");
    path
}

/// A temp directory holding `records.json` with the seeded tables.
pub fn create_notes_dir() -> TempDir {
    let tmp_dir = TempDir::new().expect("Failed to create temp dir");
    let data = json!({
        "page": [{"name": "Proj A"}, {"name": "X"}, {"name": "Proj B"}, {"name": "Proj C"}],
        "task": [{"name": "write", "done": false}, {"name": "test", "done": true}]
    });
    write_file(tmp_dir.path(), "records.json", &data.to_string());
    tmp_dir
}
