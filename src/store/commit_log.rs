/*!
 * Per-unit commit markers.
 *
 * The commit log sits next to the output store (`<output>.commits.jsonl`)
 * and receives one JSON line per completed unit, written only after that
 * unit's records are durable in the output store. Each marker records the
 * output store's length right after the unit's block, so the last marker
 * tells exactly how much of the output store is committed. The first line is
 * a baseline marker written before any unit, holding the length the store
 * already had.
 */

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::StoreError;
use crate::file_utils::FileManager;

/// Suffix appended to the output store's file name
pub const COMMIT_LOG_SUFFIX: &str = ".commits.jsonl";

/// Marker for one completed unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitMarker {
    /// Unit id exactly as it appears in the input store, null for the baseline
    pub unit_id: Value,
    /// Number of output records written for the unit
    pub pairs: usize,
    /// Output store length after the unit's block was appended
    pub end_offset: u64,
    /// Run that committed the unit
    pub run_id: String,
    /// When the marker was written
    pub committed_at: DateTime<Utc>,
}

impl CommitMarker {
    /// Marker opening a commit log: no unit, only the output store length
    /// that was already committed when the log was started
    pub fn baseline(end_offset: u64, run_id: impl Into<String>) -> Self {
        Self {
            unit_id: Value::Null,
            pairs: 0,
            end_offset,
            run_id: run_id.into(),
            committed_at: Utc::now(),
        }
    }

    pub fn is_baseline(&self) -> bool {
        self.unit_id.is_null()
    }
}

/// What `repair_tail` had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailRepair {
    /// Log was empty or ended with a newline
    Clean,
    /// Last marker was complete but missing its newline
    Terminated,
    /// Last line was a torn write and was cut off
    Truncated { bytes: u64 },
}

/// Sidecar log of commit markers
#[derive(Debug, Clone)]
pub struct CommitLog {
    path: PathBuf,
}

impl CommitLog {
    /// Commit log belonging to an output store
    pub fn for_output<P: AsRef<Path>>(output: P) -> Self {
        Self {
            path: FileManager::sidecar_path(output, COMMIT_LOG_SUFFIX),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        FileManager::file_exists(&self.path)
    }

    /// Read every marker
    ///
    /// A final line without a newline that does not decode is a torn write
    /// and is ignored; any other undecodable line is a malformed record.
    pub fn read_all(&self) -> Result<Vec<CommitMarker>, StoreError> {
        if !self.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| StoreError::read(format!("reading commit log {}", self.path.display()), e))?;
        let terminated = content.ends_with('\n');
        let lines: Vec<&str> = content.lines().collect();

        let mut markers = Vec::with_capacity(lines.len());
        for (index, line) in lines.iter().enumerate() {
            let is_last = index + 1 == lines.len();
            match serde_json::from_str::<CommitMarker>(line) {
                Ok(marker) => markers.push(marker),
                Err(_) if is_last && !terminated => {
                    warn!("Ignoring torn commit marker at {}:{}", self.path.display(), index + 1);
                }
                Err(e) => {
                    return Err(StoreError::malformed(&self.path, index + 1, e.to_string()));
                }
            }
        }
        Ok(markers)
    }

    /// Make the log end on a line boundary before anything is appended
    pub fn repair_tail(&self) -> Result<TailRepair, StoreError> {
        if !self.exists() {
            return Ok(TailRepair::Clean);
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| StoreError::read(format!("reading commit log {}", self.path.display()), e))?;
        if content.is_empty() || content.ends_with('\n') {
            return Ok(TailRepair::Clean);
        }

        let tail_start = content.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let tail = &content[tail_start..];

        if serde_json::from_str::<CommitMarker>(tail).is_ok() {
            let mut file = OpenOptions::new()
                .append(true)
                .open(&self.path)
                .map_err(|e| StoreError::write("opening commit log", e))?;
            file.write_all(b"\n")
                .and_then(|_| file.sync_all())
                .map_err(|e| StoreError::write("terminating commit log", e))?;
            Ok(TailRepair::Terminated)
        } else {
            FileManager::truncate_to(&self.path, tail_start as u64)
                .map_err(|e| StoreError::write("truncating torn commit marker", e))?;
            Ok(TailRepair::Truncated {
                bytes: (content.len() - tail_start) as u64,
            })
        }
    }

    /// Append one marker and sync
    pub fn append(&self, marker: &CommitMarker) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(marker)
            .map_err(|e| StoreError::write("serializing commit marker", e.into()))?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::write(format!("opening commit log {}", self.path.display()), e))?;
        file.write_all(&line)
            .map_err(|e| StoreError::write("appending commit marker", e))?;
        file.sync_all()
            .map_err(|e| StoreError::write("syncing commit log", e))?;
        Ok(())
    }
}
