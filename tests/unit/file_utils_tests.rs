/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::fs;
use talkalign::file_utils::FileManager;
use crate::common;

/// Test touching a missing file
#[test]
fn test_ensure_file_withMissingParent_shouldCreateEmptyFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("nested").join("out.jsonl");

    FileManager::ensure_file(&path)?;
    assert!(FileManager::file_exists(&path));
    assert_eq!(FileManager::file_len(&path)?, 0);
    Ok(())
}

/// Test that touching an existing file keeps its content
#[test]
fn test_ensure_file_withExistingFile_shouldKeepContent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "out.jsonl", "{\"TALK-ID\": 1}\n")?;

    FileManager::ensure_file(&path)?;
    assert_eq!(fs::read_to_string(&path)?, "{\"TALK-ID\": 1}\n");
    Ok(())
}

/// Test truncation
#[test]
fn test_truncate_to_withShorterLength_shouldCutTail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "out.jsonl", "line one\nline two\n")?;

    FileManager::truncate_to(&path, 9)?;
    assert_eq!(fs::read_to_string(&path)?, "line one\n");
    Ok(())
}

/// Test sidecar naming
#[test]
fn test_sidecar_path_withSuffix_shouldAppendToFileName() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = temp_dir.path().join("pairs.jsonl");
    let sidecar = FileManager::sidecar_path(&path, ".commits.jsonl");
    assert_eq!(sidecar, temp_dir.path().join("pairs.jsonl.commits.jsonl"));
}

/// Test the length of a missing file
#[test]
fn test_file_len_withMissingFile_shouldBeZero() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    assert_eq!(FileManager::file_len(temp_dir.path().join("absent.jsonl"))?, 0);
    Ok(())
}
