/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use std::fs;
use talkalign::app_config::{AlignerBackend, Config, DefaultQuota, LogLevel, MissingLanguagePolicy};
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "es");
    assert_eq!(config.unit_quota, None);
    assert_eq!(config.default_quota, DefaultQuota::OutputRecordCount);
    assert_eq!(config.offset, 0);
    assert!(!config.include_attribute);
    assert!(config.commit_log);
    assert_eq!(config.on_missing_language, MissingLanguagePolicy::Abort);
    assert_eq!(config.schema.documents_field, "TRANSCRIPTS");
    assert_eq!(config.aligner.backend, AlignerBackend::Http);
    assert_eq!(config.aligner.endpoint, "http://localhost:8000");
    assert_eq!(config.log_level, LogLevel::Info);

    assert_eq!(config.alignment.max_align, 5);
    assert_eq!(config.alignment.top_k, 3);
    assert_eq!(config.alignment.win, 5);
    assert!((config.alignment.skip - -0.1).abs() < f64::EPSILON);
    assert!(config.alignment.margin);
    assert!(config.alignment.len_penalty);
    assert!(!config.alignment.is_split);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    // Invalid source language
    config.source_language = "xyz".to_string();
    assert!(config.validate().is_err());
    config.source_language = "eng".to_string();
    assert!(config.validate().is_ok());

    // Same language under two codes
    config.target_language = "en".to_string();
    assert!(config.validate().is_err());
    config.target_language = "es".to_string();

    // Attribute requested by a schema without one
    config.schema.attribute_field = None;
    config.include_attribute = true;
    assert!(config.validate().is_err());
    config.include_attribute = false;
    assert!(config.validate().is_ok());

    // Degenerate alignment parameters
    config.alignment.max_align = 0;
    assert!(config.validate().is_err());
    config.alignment.max_align = 5;

    // Bad endpoint only matters for the http backend
    config.aligner.endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
    config.aligner.backend = AlignerBackend::Mock;
    assert!(config.validate().is_ok());
}

/// Test that a language key may not shadow a schema field
#[test]
fn test_config_validation_withCollidingLanguageKey_shouldFail() {
    let mut config = Config::default();
    config.schema.name_field = "ES".to_string();
    assert!(config.validate().is_err());
}

/// Test the quota resolution rules
#[test]
fn test_effective_quota_withEachMode_shouldResolveQuota() {
    let mut config = Config::default();
    assert_eq!(config.effective_quota(7), Some(7));
    assert_eq!(config.effective_quota(0), Some(0));

    config.default_quota = DefaultQuota::Unbounded;
    assert_eq!(config.effective_quota(7), None);

    config.unit_quota = Some(3);
    assert_eq!(config.effective_quota(7), Some(3));
}

/// Test parsing a partial config file
#[test]
fn test_from_file_withPartialConfig_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{
            "source_language": "fr",
            "target_language": "de",
            "unit_quota": 10,
            "on_missing_language": "skip",
            "schema": {"documents_field": "TRANSCRIPT", "attribute_field": null},
            "aligner": {"backend": "mock"}
        }"#,
    )?;

    let config = Config::from_file(&path)?;
    assert_eq!(config.source_language, "fr");
    assert_eq!(config.unit_quota, Some(10));
    assert_eq!(config.on_missing_language, MissingLanguagePolicy::Skip);
    assert_eq!(config.schema.documents_field, "TRANSCRIPT");
    assert_eq!(config.schema.id_field, "TALK-ID");
    assert_eq!(config.schema.attribute_field, None);
    assert_eq!(config.aligner.backend, AlignerBackend::Mock);
    assert_eq!(config.aligner.timeout_secs, 600);
    assert!(config.validate().is_ok());
    Ok(())
}

/// Test that a missing config file is created from defaults
#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;
    assert!(path.exists());
    assert_eq!(config.target_language, "es");

    let reloaded = Config::from_file(&path)?;
    assert_eq!(reloaded.source_language, config.source_language);
    assert_eq!(reloaded.commit_log, config.commit_log);
    assert!(fs::read_to_string(&path)?.contains("\"default_quota\": \"output_record_count\""));
    Ok(())
}

/// Test aligner backend display names
#[test]
fn test_aligner_backend_display_withEachBackend_shouldBeLowercase() {
    assert_eq!(AlignerBackend::Http.to_string(), "http");
    assert_eq!(AlignerBackend::Mock.to_string(), "mock");
}
