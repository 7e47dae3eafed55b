/*!
 * Tests for error types and conversions
 */

use std::io;
use std::path::PathBuf;
use talkalign::errors::{AlignerError, AppError, StoreError};

/// Test error messages carry their location
#[test]
fn test_store_error_display_withMalformedRecord_shouldIncludeLocation() {
    let error = StoreError::malformed(PathBuf::from("talks.jsonl"), 3, "expected a JSON object");
    let message = error.to_string();
    assert!(message.contains("talks.jsonl:3"));
    assert!(message.contains("expected a JSON object"));
}

/// Test error conversion into the application error
#[test]
fn test_app_error_from_withNestedErrors_shouldWrap() {
    let store: AppError = StoreError::write("appending unit 1", io::Error::other("disk full")).into();
    assert!(matches!(store, AppError::Store(StoreError::IoWrite { .. })));
    assert!(store.to_string().contains("appending unit 1"));

    let aligner: AppError = AlignerError::Api {
        status_code: 503,
        message: "busy".to_string(),
    }
    .into();
    assert!(matches!(aligner, AppError::Aligner(_)));
    assert!(aligner.to_string().contains("503"));
}

/// Test the commit log mismatch message
#[test]
fn test_commit_log_mismatch_display_shouldShowBothLengths() {
    let error = StoreError::CommitLogMismatch {
        committed: 120,
        actual: 80,
    };
    let message = error.to_string();
    assert!(message.contains("120"));
    assert!(message.contains("80"));
}
