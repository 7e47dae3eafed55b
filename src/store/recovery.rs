/*!
 * Orphan recovery for the output store.
 *
 * A crash between a unit's block landing in the output store and its commit
 * marker landing in the commit log leaves records nobody committed. Before
 * the ledger is loaded, those bytes are cut from the output store so the
 * unit is reprocessed from scratch without leaving duplicates behind.
 */

use log::{info, warn};
use std::path::Path;

use crate::errors::StoreError;
use crate::file_utils::FileManager;

use super::commit_log::{CommitLog, CommitMarker, TailRepair};

/// What recovery found and fixed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Uncommitted bytes cut from the end of the output store
    pub orphaned_bytes: u64,
    /// Torn bytes cut from the end of the commit log
    pub torn_marker_bytes: u64,
}

impl RecoveryReport {
    pub fn is_clean(&self) -> bool {
        self.orphaned_bytes == 0 && self.torn_marker_bytes == 0
    }
}

/// Bring the output store back to its last committed length
///
/// A store without commit markers gets a baseline marker first, at the
/// length of its newline-terminated prefix, so a crash during the first unit
/// a run writes is recoverable like any later one.
pub fn recover<P: AsRef<Path>>(
    output: P,
    commit_log: &CommitLog,
    run_id: &str,
) -> Result<RecoveryReport, StoreError> {
    let output = output.as_ref();
    let mut report = RecoveryReport::default();

    match commit_log.repair_tail()? {
        TailRepair::Truncated { bytes } => {
            warn!("Discarded {} bytes of a torn commit marker in {}", bytes, commit_log.path().display());
            report.torn_marker_bytes = bytes;
        }
        TailRepair::Terminated => {
            info!("Terminated last commit marker in {}", commit_log.path().display());
        }
        TailRepair::Clean => {}
    }

    let committed = match commit_log.read_all()?.iter().map(|m| m.end_offset).max() {
        Some(offset) => offset,
        None => {
            let baseline = FileManager::terminated_len(output)
                .map_err(|e| StoreError::read(format!("measuring output store {}", output.display()), e))?;
            commit_log.append(&CommitMarker::baseline(baseline, run_id))?;
            info!(
                "Started commit log {} at {} committed bytes",
                commit_log.path().display(),
                baseline
            );
            baseline
        }
    };

    let actual = FileManager::file_len(output)
        .map_err(|e| StoreError::read(format!("measuring output store {}", output.display()), e))?;

    if actual < committed {
        return Err(StoreError::CommitLogMismatch { committed, actual });
    }

    if actual > committed {
        let orphaned = actual - committed;
        warn!(
            "Discarding {} uncommitted bytes at the end of {} (interrupted unit)",
            orphaned,
            output.display()
        );
        FileManager::truncate_to(output, committed)
            .map_err(|e| StoreError::write("truncating uncommitted output", e))?;
        report.orphaned_bytes = orphaned;
    }

    Ok(report)
}
