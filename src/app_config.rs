use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::alignment::AlignmentParams;
use crate::corpus::SchemaMapping;
use crate::language_utils;

/// Application configuration module
/// This module handles the run configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Number of units to newly complete in this run
    #[serde(default)]
    pub unit_quota: Option<usize>,

    /// Quota used when `unit_quota` is not set
    #[serde(default)]
    pub default_quota: DefaultQuota,

    /// Leading input records to skip unconditionally
    #[serde(default)]
    pub offset: usize,

    /// Read the categorical attribute and carry it into the output
    #[serde(default)]
    pub include_attribute: bool,

    /// Field names of the input records
    #[serde(default)]
    pub schema: SchemaMapping,

    /// Parameters passed through to the aligner
    #[serde(default)]
    pub alignment: AlignmentParams,

    /// What to do with a unit lacking one of the two documents
    #[serde(default)]
    pub on_missing_language: MissingLanguagePolicy,

    /// Write per-unit commit markers next to the output store
    #[serde(default = "default_true")]
    pub commit_log: bool,

    /// Aligner selection
    #[serde(default)]
    pub aligner: AlignerConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Quota applied when no explicit unit quota is given
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DefaultQuota {
    /// As many new units as the output store has records at start
    ///
    /// Legacy semantics: the count is of records (sentence pairs), not of
    /// units, so a fresh store yields a quota of 0, which still completes
    /// one unit because the quota is checked after each completion.
    #[default]
    OutputRecordCount,
    /// Every remaining unit
    Unbounded,
}

/// Handling of units missing the source or target document
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingLanguagePolicy {
    /// Fail the run
    #[default]
    Abort,
    /// Log the unit and move on without marking it complete
    Skip,
}

/// Aligner backend type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlignerBackend {
    /// Remote alignment service
    #[default]
    Http,
    /// Positional pairing, for dry runs
    Mock,
}

impl AlignerBackend {
    // @returns: Lowercase backend identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Http => "http".to_string(),
            Self::Mock => "mock".to_string(),
        }
    }
}

impl std::fmt::Display for AlignerBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

/// Aligner configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AlignerConfig {
    // @field: Backend type
    #[serde(default)]
    pub backend: AlignerBackend,

    // @field: Service URL
    #[serde(default = "default_aligner_endpoint")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            backend: AlignerBackend::default(),
            endpoint: default_aligner_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "es".to_string()
}

fn default_true() -> bool {
    true
}

fn default_aligner_endpoint() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    // Long transcripts take a while to embed
    600
}

impl Config {
    /// Load the configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).context(format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load the configuration, writing the defaults first if the file is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .context(format!("Failed to write default config to file: {}", path.display()))?;
        Ok(config)
    }

    /// Quota for a run over an output store holding `record_count` records
    ///
    /// `None` means unbounded.
    pub fn effective_quota(&self, record_count: usize) -> Option<usize> {
        match (self.unit_quota, self.default_quota) {
            (Some(quota), _) => Some(quota),
            (None, DefaultQuota::OutputRecordCount) => Some(record_count),
            (None, DefaultQuota::Unbounded) => None,
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        let _source_name = language_utils::get_language_name(&self.source_language)?;
        let _target_name = language_utils::get_language_name(&self.target_language)?;

        if language_utils::language_codes_match(&self.source_language, &self.target_language) {
            return Err(anyhow!(
                "Source and target language must differ (both are {})",
                self.source_language
            ));
        }

        // Validate schema field names
        let mut fields = vec![
            self.schema.id_field.as_str(),
            self.schema.name_field.as_str(),
            self.schema.documents_field.as_str(),
        ];
        if self.include_attribute {
            match self.schema.attribute_field.as_deref() {
                Some(field) => fields.push(field),
                None => {
                    return Err(anyhow!(
                        "include_attribute is enabled but the schema has no attribute_field"
                    ));
                }
            }
        }
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(anyhow!("Schema field names must not be empty"));
        }

        // Output text keys must not shadow metadata keys
        for key in [
            language_utils::output_key(&self.source_language),
            language_utils::output_key(&self.target_language),
        ] {
            if fields.contains(&key.as_str()) {
                return Err(anyhow!("Language key '{}' collides with a schema field", key));
            }
        }

        // Validate alignment parameters
        if self.alignment.max_align == 0 || self.alignment.top_k == 0 {
            return Err(anyhow!("alignment.max_align and alignment.top_k must be at least 1"));
        }

        // Validate the aligner endpoint
        if self.aligner.backend == AlignerBackend::Http {
            url::Url::parse(&self.aligner.endpoint)
                .map_err(|e| anyhow!("Invalid aligner endpoint '{}': {}", self.aligner.endpoint, e))?;
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            unit_quota: None,
            default_quota: DefaultQuota::default(),
            offset: 0,
            include_attribute: false,
            schema: SchemaMapping::default(),
            alignment: AlignmentParams::default(),
            on_missing_language: MissingLanguagePolicy::default(),
            commit_log: true,
            aligner: AlignerConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
