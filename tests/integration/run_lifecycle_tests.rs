/*!
 * Integration tests for the quota, offset and resume behavior of runs
 */

use anyhow::Result;
use serde_json::json;
use std::fs;
use std::sync::Arc;
use talkalign::alignment::MockAligner;
use talkalign::app_config::{Config, DefaultQuota};
use talkalign::app_controller::{Controller, StopReason};
use crate::common;

fn controller(config: Config, aligner: &MockAligner) -> Result<Controller> {
    common::init_logging();
    Ok(Controller::with_aligner(config, Arc::new(aligner.clone()))?)
}

/// Test that a quota bounds each run and the next run continues
#[test]
fn test_run_withQuotaTwoThenOne_shouldCompleteAllThree() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::write_talks(temp_dir.path(), &[101, 102, 103])?;
    let output = temp_dir.path().join("pairs.jsonl");
    let aligner = MockAligner::positional();

    let first = tokio_test::block_on(controller(common::test_config(Some(2)), &aligner)?.run(&input, &output))?;
    assert_eq!(first.units_completed, 2);
    assert_eq!(first.pairs_written, 4);
    assert_eq!(first.stop_reason, StopReason::QuotaReached);
    assert_eq!(common::store_ids(&output)?, vec![json!(101), json!(102)]);

    let second = tokio_test::block_on(controller(common::test_config(Some(1)), &aligner)?.run(&input, &output))?;
    assert_eq!(second.previously_completed, 2);
    assert_eq!(second.skipped_completed, 2);
    assert_eq!(second.units_completed, 1);
    assert_eq!(second.stop_reason, StopReason::QuotaReached);
    assert_eq!(common::store_ids(&output)?, vec![json!(101), json!(102), json!(103)]);

    let third = tokio_test::block_on(controller(common::test_config(Some(1)), &aligner)?.run(&input, &output))?;
    assert_eq!(third.units_completed, 0);
    assert_eq!(third.stop_reason, StopReason::SourceExhausted);
    assert_eq!(aligner.calls(), 3);
    Ok(())
}

/// Test the shape of the written records
#[test]
fn test_run_withPositionalAligner_shouldWriteOneRecordPerPair() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::write_talks(temp_dir.path(), &[101])?;
    let output = temp_dir.path().join("pairs.jsonl");
    let aligner = MockAligner::positional();

    tokio_test::block_on(controller(common::test_config(None), &aligner)?.run(&input, &output))?;

    let content = fs::read_to_string(&output)?;
    let first_line = content.lines().next().unwrap_or_default();
    assert_eq!(
        first_line,
        r#"{"TALK-ID":101,"TALK-NAME":"Talk 101","EN":"Hello from talk 101.","ES":"Hola desde la charla 101."}"#
    );

    let records = common::read_store(&output)?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["EN"], json!("Thank you."));
    assert_eq!(records[1]["ES"], json!("Gracias."));
    Ok(())
}

/// Test that a finished store is left untouched by another run
#[test]
fn test_run_withCompletedStore_shouldBeIdempotent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::write_talks(temp_dir.path(), &[1, 2, 3])?;
    let output = temp_dir.path().join("pairs.jsonl");
    let aligner = MockAligner::positional();

    tokio_test::block_on(controller(common::test_config(None), &aligner)?.run(&input, &output))?;
    let before = fs::read(&output)?;

    let rerun = tokio_test::block_on(controller(common::test_config(None), &aligner)?.run(&input, &output))?;
    assert_eq!(rerun.units_completed, 0);
    assert_eq!(rerun.skipped_completed, 3);
    assert_eq!(rerun.stop_reason, StopReason::SourceExhausted);
    assert_eq!(fs::read(&output)?, before);
    assert_eq!(aligner.calls(), 3);
    Ok(())
}

/// Test that an offset skips leading records
#[test]
fn test_run_withOffset_shouldSkipLeadingRecords() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::write_talks(temp_dir.path(), &[101, 102, 103])?;
    let output = temp_dir.path().join("pairs.jsonl");

    let mut config = common::test_config(None);
    config.offset = 1;
    let summary = tokio_test::block_on(controller(config, &MockAligner::positional())?.run(&input, &output))?;

    assert_eq!(summary.skipped_before_offset, 1);
    assert_eq!(summary.units_completed, 2);
    assert_eq!(common::store_ids(&output)?, vec![json!(102), json!(103)]);
    Ok(())
}

/// Test an offset past the end of the input
#[test]
fn test_run_withOffsetPastEnd_shouldCompleteNothing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::write_talks(temp_dir.path(), &[101, 102])?;
    let output = temp_dir.path().join("pairs.jsonl");

    let mut config = common::test_config(Some(5));
    config.offset = 10;
    let summary = tokio_test::block_on(controller(config, &MockAligner::positional())?.run(&input, &output))?;

    assert_eq!(summary.units_completed, 0);
    assert_eq!(summary.skipped_before_offset, 2);
    assert_eq!(summary.stop_reason, StopReason::SourceExhausted);
    assert!(output.exists());
    assert_eq!(fs::read_to_string(&output)?, "");
    Ok(())
}

/// Test that a quota of zero still completes one unit
#[test]
fn test_run_withQuotaZero_shouldCompleteOneUnit() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::write_talks(temp_dir.path(), &[101, 102])?;
    let output = temp_dir.path().join("pairs.jsonl");

    let summary =
        tokio_test::block_on(controller(common::test_config(Some(0)), &MockAligner::positional())?.run(&input, &output))?;

    assert_eq!(summary.units_completed, 1);
    assert_eq!(summary.stop_reason, StopReason::QuotaReached);
    assert_eq!(common::store_ids(&output)?, vec![json!(101)]);
    Ok(())
}

/// Test the legacy default quota taken from the output record count
#[test]
fn test_run_withDefaultQuota_shouldUseOutputRecordCount() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::write_talks(temp_dir.path(), &[1, 2, 3, 4, 5, 6])?;
    let output = temp_dir.path().join("pairs.jsonl");
    let aligner = MockAligner::positional();

    let mut config = common::test_config(None);
    config.default_quota = DefaultQuota::OutputRecordCount;

    // Fresh store: quota 0, one unit, two records
    let first = tokio_test::block_on(controller(config.clone(), &aligner)?.run(&input, &output))?;
    assert_eq!(first.quota, Some(0));
    assert_eq!(first.units_completed, 1);

    // Two records now: quota 2
    let second = tokio_test::block_on(controller(config, &aligner)?.run(&input, &output))?;
    assert_eq!(second.quota, Some(2));
    assert_eq!(second.units_completed, 2);
    assert_eq!(common::store_ids(&output)?, vec![json!(1), json!(2), json!(3)]);
    Ok(())
}

/// Test that units with no aligned pairs are recorded once
#[test]
fn test_run_withZeroPairUnits_shouldNotReprocessThem() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::write_talks(temp_dir.path(), &[1, 2])?;
    let output = temp_dir.path().join("pairs.jsonl");
    let aligner = MockAligner::empty();

    let first = tokio_test::block_on(controller(common::test_config(None), &aligner)?.run(&input, &output))?;
    assert_eq!(first.units_completed, 2);
    assert_eq!(first.pairs_written, 0);
    assert_eq!(fs::read_to_string(&output)?, "");

    let second = tokio_test::block_on(controller(common::test_config(None), &aligner)?.run(&input, &output))?;
    assert_eq!(second.units_completed, 0);
    assert_eq!(second.skipped_completed, 2);
    assert_eq!(aligner.calls(), 2);
    Ok(())
}

/// Test that the status view matches the run's progress
#[test]
fn test_status_afterRun_shouldReportCompletedUnits() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::write_talks(temp_dir.path(), &[1, 2, 3])?;
    let output = temp_dir.path().join("pairs.jsonl");

    let controller = controller(common::test_config(Some(2)), &MockAligner::positional())?;
    tokio_test::block_on(controller.run(&input, &output))?;

    let status = controller.status(&output)?;
    assert_eq!(status.completed_units, 2);
    assert_eq!(status.record_count, 4);
    assert_eq!(status.committed_markers, 2);
    assert!(status.commit_log_present);
    assert_eq!(status.uncommitted_bytes, 0);
    Ok(())
}
