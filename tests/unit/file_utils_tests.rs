/*!
 * Tests for file utility functions
 */

use std::fs;
use std::path::{Path, PathBuf};
use anyhow::Result;
use doctranslate::file_utils::{FileManager, ISSUES_LOG_NAME};
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "test_file_exists.tmp", "test content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::file_exists(temp_dir.path()));

    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

/// Test that generate_output_path keeps the directory and extension
#[test]
fn test_generate_output_path_withoutExtension_shouldKeepInputExtension() {
    let output_path = FileManager::generate_output_path(Path::new("/tmp/input/slides.pptx"), None);
    assert_eq!(output_path, PathBuf::from("/tmp/input/slides_translated.pptx"));
}

/// Test that generate_output_path replaces the extension when given
#[test]
fn test_generate_output_path_withExtension_shouldReplaceExtension() {
    let output_path = FileManager::generate_output_path(Path::new("paper.pdf"), Some(".txt"));
    assert_eq!(output_path, PathBuf::from("paper_translated.txt"));

    let output_path = FileManager::generate_output_path(Path::new("notes"), None);
    assert_eq!(output_path, PathBuf::from("notes_translated"));
}

/// Test extension normalization
#[test]
fn test_extension_of_withMixedCase_shouldReturnLowercase() {
    assert_eq!(FileManager::extension_of("Budget.XLSX"), "xlsx");
    assert_eq!(FileManager::extension_of("README"), "");
}

/// Test the issues log location
#[test]
fn test_issues_log_path_shouldSitNextToOutput() {
    assert_eq!(
        FileManager::issues_log_path("/tmp/out/deck_translated.pptx"),
        PathBuf::from("/tmp/out").join(ISSUES_LOG_NAME)
    );
    assert_eq!(FileManager::issues_log_path("deck_translated.pptx"), PathBuf::from(ISSUES_LOG_NAME));
}

/// Test that writing creates missing parent directories
#[test]
fn test_write_to_file_withMissingParent_shouldCreateDirectories() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("nested").join("dir").join("out.txt");

    FileManager::write_to_file(&path, "Hallo Welt")?;

    assert_eq!(fs::read_to_string(&path)?, "Hallo Welt");
    Ok(())
}

/// Test that log appends keep earlier entries
#[test]
fn test_append_to_log_file_twice_shouldKeepBothEntries() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join(ISSUES_LOG_NAME);

    FileManager::append_to_log_file(&path, "first issue")?;
    FileManager::append_to_log_file(&path, "second issue")?;

    let content = fs::read_to_string(&path)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with('[') && lines[0].ends_with("first issue"));
    assert!(lines[1].ends_with("second issue"));
    Ok(())
}
