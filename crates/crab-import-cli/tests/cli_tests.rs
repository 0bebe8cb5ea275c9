//! CLI integration tests for crab-import.
//!
//! These tests cover argument parsing, help output and the exit codes of
//! failures that happen before a database connection is attempted.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

/// Get a command for the crab-import binary.
fn cmd() -> Command {
    Command::cargo_bin("crab-import").unwrap()
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_arguments() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("<PATH>"))
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--with-metadata"))
        .stdout(predicate::str::contains("--commit-threshold"))
        .stdout(predicate::str::contains("--output-json"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("crab-import"));
}

#[test]
fn test_log_flags_have_defaults() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("[default: text]"))
        .stdout(predicate::str::contains("[default: info]"));
}

// =============================================================================
// Usage Errors
// =============================================================================

#[test]
fn test_missing_path_shows_usage() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_unknown_log_format_rejected() {
    let dir = tempfile::tempdir().unwrap();
    cmd()
        .arg(dir.path())
        .args(["--log-format", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("xml"));
}

// =============================================================================
// Exit Codes Before Connecting
// =============================================================================

#[test]
fn test_empty_directory_exits_with_code_2() {
    let dir = tempfile::tempdir().unwrap();
    cmd()
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No .dbf files found"));
}

#[test]
fn test_directory_without_dbf_files_exits_with_code_2() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("readme.txt"), "not a table").unwrap();
    cmd()
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No .dbf files found"));
}

#[test]
fn test_missing_directory_exits_with_code_1() {
    cmd()
        .arg("/nonexistent/crab/export")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("IO error"));
}

#[test]
fn test_invalid_yaml_exits_with_code_2() {
    let dir = tempfile::tempdir().unwrap();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "target: [").unwrap();

    cmd()
        .arg(dir.path())
        .args(["--config", file.path().to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_missing_config_file_exits_with_code_2() {
    let dir = tempfile::tempdir().unwrap();
    cmd()
        .arg(dir.path())
        .args(["--config", "nonexistent_config_file.yaml"])
        .assert()
        .code(2);
}

#[test]
fn test_zero_commit_threshold_exits_with_code_2() {
    let dir = tempfile::tempdir().unwrap();
    cmd()
        .arg(dir.path())
        .args(["--commit-threshold", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("commit_threshold"));
}
