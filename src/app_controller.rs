use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::alignment::{Aligner, AlignmentRequest, HttpAligner, MockAligner};
use crate::app_config::{AlignerBackend, Config, MissingLanguagePolicy};
use crate::corpus::{Document, UnitSource, WorkUnit};
use crate::errors::{AppError, StoreError};
use crate::file_utils::FileManager;
use crate::store::{self, CommitLog, CompletionLedger, RecoveryReport, ResultWriter};

// @module: Run controller for resumable corpus alignment

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The quota of newly completed units was reached
    QuotaReached,
    /// The input store ran out first
    SourceExhausted,
}

/// Outcome of one run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Identifier written into this run's commit markers
    pub run_id: String,
    /// Quota in force, `None` when unbounded
    pub quota: Option<usize>,
    /// Units completed before this run started
    pub previously_completed: usize,
    /// Units newly completed by this run
    pub units_completed: usize,
    /// Output records written by this run
    pub pairs_written: usize,
    /// Records skipped because they sit before the offset
    pub skipped_before_offset: usize,
    /// Units skipped because they were already complete
    pub skipped_completed: usize,
    /// Ids of units skipped for lacking a document
    pub skipped_missing_language: Vec<String>,
    /// What recovery cleaned up before the run
    pub recovery: RecoveryReport,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

/// Ledger view of an output store, without processing anything
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatus {
    pub completed_units: usize,
    pub record_count: usize,
    pub committed_markers: usize,
    pub commit_log_present: bool,
    /// Bytes past the last commit marker, cut by the next run
    pub uncommitted_bytes: u64,
}

/// Main application controller for resumable alignment runs
///
/// Processes one unit at a time in input order: skip it if it sits before
/// the offset or is already in the ledger, otherwise align it, append its
/// records, record it in the ledger, and stop once the quota of new
/// completions is met.
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Alignment collaborator
    aligner: Arc<dyn Aligner>,
}

impl Controller {
    // @method: Create a new controller with the given configuration and aligner
    pub fn with_aligner(config: Config, aligner: Arc<dyn Aligner>) -> Result<Self, AppError> {
        config
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;
        Ok(Self { config, aligner })
    }

    // @method: Create a new controller, building the aligner the configuration names
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        let aligner: Arc<dyn Aligner> = match config.aligner.backend {
            AlignerBackend::Http => Arc::new(HttpAligner::new(
                &config.aligner.endpoint,
                config.aligner.timeout_secs,
            )?),
            AlignerBackend::Mock => Arc::new(MockAligner::positional()),
        };
        debug!("Using the {} aligner backend", config.aligner.backend);
        Self::with_aligner(config, aligner)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run over `input`, appending to `output`
    pub async fn run(&self, input: &Path, output: &Path) -> Result<RunSummary, AppError> {
        let start_time = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        let config = &self.config;

        FileManager::ensure_file(output)
            .map_err(|e| StoreError::write(format!("creating output store {}", output.display()), e))?;

        let commit_log = CommitLog::for_output(output);
        let (recovery, mut ledger) = if config.commit_log {
            let recovery = store::recover(output, &commit_log, &run_id)?;
            let ledger =
                CompletionLedger::load_with_commits(output, &config.schema.id_field, &commit_log)?;
            (recovery, ledger)
        } else {
            if commit_log.exists() {
                warn!(
                    "Commit log {} exists but commit markers are disabled; it will fall out of date",
                    commit_log.path().display()
                );
            }
            let ledger = CompletionLedger::load(output, &config.schema.id_field)?;
            (RecoveryReport::default(), ledger)
        };

        let previously_completed = ledger.len();
        let quota = config.effective_quota(ledger.record_count());

        info!(
            "Run {}: {} -> {} ({} → {}), {} units already done, quota {}, offset {}",
            &run_id[..8],
            input.display(),
            output.display(),
            config.source_language,
            config.target_language,
            previously_completed,
            quota.map(|q| q.to_string()).unwrap_or_else(|| "unbounded".to_string()),
            config.offset
        );

        let mut writer = ResultWriter::new(
            output,
            config.schema.clone(),
            &config.source_language,
            &config.target_language,
            config.include_attribute,
        );
        if config.commit_log {
            writer = writer.with_commit_log(commit_log, run_id.clone());
        }

        let mut source = UnitSource::open(input, config.schema.clone(), config.include_attribute)?
            .starting_at(config.offset);

        let progress_bar = Self::progress_bar(quota.map(|q| config.offset + q.max(1)));

        let mut units_completed = 0usize;
        let mut pairs_written = 0usize;
        let mut skipped_completed = 0usize;
        let mut skipped_missing_language = Vec::new();

        let stop_reason = loop {
            let sourced = match source.next() {
                Some(item) => item?,
                None => break StopReason::SourceExhausted,
            };
            let unit = sourced.unit;
            let key = unit.id.key().to_string();

            if ledger.contains(&key) {
                debug!("Skipping unit {} at position {}: already aligned", unit.id, sourced.position);
                skipped_completed += 1;
                continue;
            }

            let (source_doc, target_doc) = match self.documents(&unit) {
                Ok(documents) => documents,
                Err(e) => match config.on_missing_language {
                    MissingLanguagePolicy::Abort => return Err(e.into()),
                    MissingLanguagePolicy::Skip => {
                        warn!("Skipping unit at position {}: {}", sourced.position, e);
                        skipped_missing_language.push(unit.id.to_string());
                        continue;
                    }
                },
            };

            for (language, document) in [
                (&config.source_language, source_doc),
                (&config.target_language, target_doc),
            ] {
                if document.is_empty() {
                    warn!("Unit {} has an empty '{}' document", unit.id, language);
                }
            }

            progress_bar.set_position((source.skipped_before_offset() + units_completed) as u64);
            progress_bar.set_message(unit.display_name());
            debug!(
                "Aligning unit {} at position {} with {}",
                unit.id,
                sourced.position,
                self.aligner.name()
            );

            let pairs = self
                .aligner
                .align(AlignmentRequest {
                    source_language: &config.source_language,
                    target_language: &config.target_language,
                    source: source_doc,
                    target: target_doc,
                    params: &config.alignment,
                })
                .await?;

            let outcome = writer.append(&unit, &pairs)?;
            if outcome.pairs_written == 0 {
                warn!("Unit {} produced no aligned pairs", unit.id);
            }

            ledger.insert(key);
            units_completed += 1;
            pairs_written += outcome.pairs_written;
            progress_bar.inc(1);

            if quota.is_some_and(|q| units_completed >= q) {
                break StopReason::QuotaReached;
            }
        };

        progress_bar.finish_and_clear();

        let summary = RunSummary {
            run_id,
            quota,
            previously_completed,
            units_completed,
            pairs_written,
            skipped_before_offset: source.skipped_before_offset(),
            skipped_completed,
            skipped_missing_language,
            recovery,
            stop_reason,
            elapsed: start_time.elapsed(),
        };

        info!(
            "Run finished ({:?}): {} new units, {} pairs, {} already done skipped, in {}",
            summary.stop_reason,
            summary.units_completed,
            summary.pairs_written,
            summary.skipped_completed,
            Self::format_duration(summary.elapsed)
        );

        Ok(summary)
    }

    /// Inspect an output store the way a run would see it
    pub fn status(&self, output: &Path) -> Result<StoreStatus, AppError> {
        let id_field = &self.config.schema.id_field;
        let commit_log = CommitLog::for_output(output);
        let commit_log_present = self.config.commit_log && commit_log.exists();

        let ledger = if commit_log_present {
            CompletionLedger::load_with_commits(output, id_field, &commit_log)?
        } else {
            CompletionLedger::load(output, id_field)?
        };

        let uncommitted_bytes = if commit_log_present {
            let committed = commit_log.read_all()?.iter().map(|m| m.end_offset).max();
            let actual = FileManager::file_len(output)
                .map_err(|e| StoreError::read(format!("measuring output store {}", output.display()), e))?;
            committed.map(|c| actual.saturating_sub(c)).unwrap_or(0)
        } else {
            0
        };

        Ok(StoreStatus {
            completed_units: ledger.len(),
            record_count: ledger.record_count(),
            committed_markers: ledger.committed_markers(),
            commit_log_present,
            uncommitted_bytes,
        })
    }

    /// Source and target documents of a unit
    fn documents<'a>(&self, unit: &'a WorkUnit) -> Result<(&'a Document, &'a Document), StoreError> {
        let lookup = |language: &str| {
            unit.document(language).ok_or_else(|| StoreError::MissingLanguage {
                unit_id: unit.id.to_string(),
                language: language.to_string(),
            })
        };
        Ok((lookup(&self.config.source_language)?, lookup(&self.config.target_language)?))
    }

    /// Bar over `offset + quota` records, or a spinner when unbounded
    fn progress_bar(len: Option<usize>) -> ProgressBar {
        let progress_bar = match len {
            Some(len) => ProgressBar::new(len as u64),
            None => ProgressBar::new_spinner(),
        };
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }

    /// Format a duration as `1m 05s` or `12.3s`
    pub fn format_duration(duration: Duration) -> String {
        let secs = duration.as_secs();
        if secs >= 60 {
            format!("{}m {:02}s", secs / 60, secs % 60)
        } else {
            format!("{:.1}s", duration.as_secs_f64())
        }
    }
}
