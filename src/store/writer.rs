/*!
 * Result writer.
 *
 * Appends one output record per aligned pair. A unit's records are staged in
 * memory, appended to the output store with a single write and synced, and
 * only then acknowledged with a commit marker.
 */

use chrono::Utc;
use log::debug;
use serde_json::{Map, Value};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::alignment::AlignedPair;
use crate::corpus::{SchemaMapping, WorkUnit};
use crate::errors::StoreError;
use crate::language_utils;

use super::commit_log::{CommitLog, CommitMarker};

/// Result of appending one unit
#[derive(Debug, Clone, PartialEq)]
pub struct AppendOutcome {
    /// Records written
    pub pairs_written: usize,
    /// Bytes appended to the output store
    pub bytes_written: u64,
    /// Output store length after the append
    pub end_offset: u64,
    /// Marker written to the commit log, when one is configured
    pub marker: Option<CommitMarker>,
}

/// Appends output records for completed units
#[derive(Debug)]
pub struct ResultWriter {
    output: PathBuf,
    schema: SchemaMapping,
    include_attribute: bool,
    source_key: String,
    target_key: String,
    commit_log: Option<CommitLog>,
    run_id: String,
}

impl ResultWriter {
    /// Writer for `output`, keying texts by the uppercased language codes
    pub fn new<P: AsRef<Path>>(
        output: P,
        schema: SchemaMapping,
        source_language: &str,
        target_language: &str,
        include_attribute: bool,
    ) -> Self {
        Self {
            output: output.as_ref().to_path_buf(),
            schema,
            include_attribute,
            source_key: language_utils::output_key(source_language),
            target_key: language_utils::output_key(target_language),
            commit_log: None,
            run_id: String::new(),
        }
    }

    /// Acknowledge each unit in `commit_log`, tagged with `run_id`
    pub fn with_commit_log(mut self, commit_log: CommitLog, run_id: impl Into<String>) -> Self {
        self.commit_log = Some(commit_log);
        self.run_id = run_id.into();
        self
    }

    /// Build the output record for one pair
    ///
    /// Key order: id, name, attribute (when enabled), source text, target text.
    pub fn build_record(&self, unit: &WorkUnit, pair: &AlignedPair) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert(self.schema.id_field.clone(), unit.id.raw().clone());
        record.insert(self.schema.name_field.clone(), unit.name.clone());
        if self.include_attribute {
            if let Some(field) = &self.schema.attribute_field {
                record.insert(field.clone(), unit.attribute.clone().unwrap_or(Value::Null));
            }
        }
        record.insert(self.source_key.clone(), Value::String(pair.source_text.clone()));
        record.insert(self.target_key.clone(), Value::String(pair.target_text.clone()));
        record
    }

    /// Serialize a unit's records into one block of JSON lines
    pub fn stage(&self, unit: &WorkUnit, pairs: &[AlignedPair]) -> Result<Vec<u8>, StoreError> {
        let mut block = Vec::new();
        for pair in pairs {
            serde_json::to_writer(&mut block, &self.build_record(unit, pair))
                .map_err(|e| StoreError::write("serializing output record", e.into()))?;
            block.push(b'\n');
        }
        Ok(block)
    }

    /// Append all records of a completed unit, then commit it
    pub fn append(&self, unit: &WorkUnit, pairs: &[AlignedPair]) -> Result<AppendOutcome, StoreError> {
        let block = self.stage(unit, pairs)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.output)
            .map_err(|e| StoreError::write(format!("opening output store {}", self.output.display()), e))?;

        if !block.is_empty() {
            file.write_all(&block)
                .map_err(|e| StoreError::write(format!("appending unit {}", unit.id), e))?;
            file.sync_all()
                .map_err(|e| StoreError::write("syncing output store", e))?;
        }

        let end_offset = file
            .metadata()
            .map_err(|e| StoreError::write("measuring output store", e))?
            .len();
        drop(file);

        let marker = match &self.commit_log {
            Some(log) => {
                let marker = CommitMarker {
                    unit_id: unit.id.raw().clone(),
                    pairs: pairs.len(),
                    end_offset,
                    run_id: self.run_id.clone(),
                    committed_at: Utc::now(),
                };
                log.append(&marker)?;
                Some(marker)
            }
            None => None,
        };

        debug!(
            "Committed unit {} ({} records, {} bytes)",
            unit.id,
            pairs.len(),
            block.len()
        );

        Ok(AppendOutcome {
            pairs_written: pairs.len(),
            bytes_written: block.len() as u64,
            end_offset,
            marker,
        })
    }
}
