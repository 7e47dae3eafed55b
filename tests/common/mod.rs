/*!
 * Common test utilities for the talkalign test suite
 */

use anyhow::Result;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use talkalign::app_config::{AlignerBackend, Config, DefaultQuota};

/// Routes library logging to the test output, once per process
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// A talk record in the `TRANSCRIPTS` layout with two sentences per language
pub fn talk(id: i64, gender: &str) -> Value {
    json!({
        "TALK-ID": id,
        "TALK-NAME": format!("Talk {}", id),
        "GENDER": gender,
        "TRANSCRIPTS": {
            "en": format!("Hello from talk {}. Thank you.", id),
            "es": format!("Hola desde la charla {}. Gracias.", id)
        }
    })
}

/// Writes records as a JSON-lines store
pub fn write_store(dir: &Path, filename: &str, records: &[Value]) -> Result<PathBuf> {
    let mut content = String::new();
    for record in records {
        content.push_str(&serde_json::to_string(record)?);
        content.push('\n');
    }
    create_test_file(dir, filename, &content)
}

/// Writes an input store of talks with the given ids
pub fn write_talks(dir: &Path, ids: &[i64]) -> Result<PathBuf> {
    let records: Vec<Value> = ids.iter().map(|id| talk(*id, "female")).collect();
    write_store(dir, "talks.jsonl", &records)
}

/// Reads a JSON-lines store back into values
pub fn read_store(path: &Path) -> Result<Vec<Value>> {
    let content = fs::read_to_string(path)?;
    content
        .lines()
        .map(|line| Ok(serde_json::from_str(line)?))
        .collect()
}

/// Distinct ids of an output store, in first-seen order
pub fn store_ids(path: &Path) -> Result<Vec<Value>> {
    let mut ids: Vec<Value> = Vec::new();
    for record in read_store(path)? {
        let id = record["TALK-ID"].clone();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// A configuration using the mock aligner and an explicit quota
pub fn test_config(quota: Option<usize>) -> Config {
    let mut config = Config::default();
    config.aligner.backend = AlignerBackend::Mock;
    config.unit_quota = quota;
    if quota.is_none() {
        config.default_quota = DefaultQuota::Unbounded;
    }
    config
}
