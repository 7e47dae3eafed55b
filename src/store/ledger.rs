/*!
 * Completion ledger.
 *
 * The set of unit ids already present in the output store, united with the
 * ids of the commit log. Loaded once when a run starts and then updated in
 * memory as units complete; the store writes are the only durable state.
 */

use log::debug;
use serde_json::Value;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use crate::corpus::UnitId;
use crate::errors::StoreError;

use super::commit_log::CommitLog;

/// Ids of completed units
#[derive(Debug, Clone, Default)]
pub struct CompletionLedger {
    completed: HashSet<String>,
    record_count: usize,
    committed_markers: usize,
}

impl CompletionLedger {
    /// An empty ledger
    pub fn empty() -> Self {
        Self::default()
    }

    /// Scan the output store for the ids of completed units
    ///
    /// A missing store is an empty ledger. Every line must be a JSON object
    /// carrying `id_field`.
    pub fn load<P: AsRef<Path>>(output: P, id_field: &str) -> Result<Self, StoreError> {
        Self::scan(output.as_ref(), id_field, None)
    }

    /// Scan the output store up to its committed length and fold in the
    /// commit log's units
    ///
    /// Units that produced no pairs only appear in the commit log. Bytes past
    /// the last marker's end offset belong to no committed unit and are not
    /// read; the baseline marker bounds the scan before any unit commits.
    pub fn load_with_commits<P: AsRef<Path>>(
        output: P,
        id_field: &str,
        commit_log: &CommitLog,
    ) -> Result<Self, StoreError> {
        let markers = commit_log.read_all()?;
        let limit = markers.iter().map(|m| m.end_offset).max();

        let mut ledger = Self::scan(output.as_ref(), id_field, limit)?;
        for marker in &markers {
            if let Some(key) = UnitId::key_of(&marker.unit_id) {
                ledger.completed.insert(key);
            }
        }
        ledger.committed_markers = markers.iter().filter(|m| !m.is_baseline()).count();
        Ok(ledger)
    }

    fn scan(output: &Path, id_field: &str, limit: Option<u64>) -> Result<Self, StoreError> {
        let file = match File::open(output) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::empty()),
            Err(e) => {
                return Err(StoreError::read(
                    format!("opening output store {}", output.display()),
                    e,
                ));
            }
        };

        let reader: Box<dyn Read> = match limit {
            Some(limit) => Box::new(file.take(limit)),
            None => Box::new(file),
        };

        let mut ledger = Self::empty();
        for (index, line) in BufReader::new(reader).lines().enumerate() {
            let line_no = index + 1;
            let line = line.map_err(|e| match e.kind() {
                io::ErrorKind::InvalidData => {
                    StoreError::malformed(output, line_no, "line is not valid UTF-8")
                }
                _ => StoreError::read(format!("reading output store {}", output.display()), e),
            })?;

            let record: Value = serde_json::from_str(&line)
                .map_err(|e| StoreError::malformed(output, line_no, e.to_string()))?;
            let key = record
                .as_object()
                .ok_or_else(|| StoreError::malformed(output, line_no, "expected a JSON object"))?
                .get(id_field)
                .ok_or_else(|| {
                    StoreError::malformed(output, line_no, format!("missing field '{}'", id_field))
                })
                .and_then(|id| {
                    UnitId::key_of(id).ok_or_else(|| {
                        StoreError::malformed(
                            output,
                            line_no,
                            format!("field '{}' must be a string or a number", id_field),
                        )
                    })
                })?;

            ledger.completed.insert(key);
            ledger.record_count += 1;
        }

        debug!(
            "Loaded {} completed units from {} records in {}",
            ledger.completed.len(),
            ledger.record_count,
            output.display()
        );
        Ok(ledger)
    }

    /// Whether a unit is already done
    pub fn contains(&self, key: &str) -> bool {
        self.completed.contains(key)
    }

    /// Record a newly completed unit; false if it was already present
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.completed.insert(key.into())
    }

    /// Number of distinct completed units
    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    /// Records found in the output store at load time
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Commit markers found at load time
    pub fn committed_markers(&self) -> usize {
        self.committed_markers
    }
}
