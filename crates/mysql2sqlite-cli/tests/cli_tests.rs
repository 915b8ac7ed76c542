//! CLI integration tests for mysql2sqlite.
//!
//! These tests verify command-line argument parsing, help output,
//! and exit codes for error conditions that occur before any database
//! connection is attempted.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

/// Get a command for the mysql2sqlite binary.
fn cmd() -> Command {
    Command::cargo_bin("mysql2sqlite").unwrap()
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_connection_flags() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--sqliteFile"))
        .stdout(predicate::str::contains("--sqlitePassword"))
        .stdout(predicate::str::contains("--mysqlUser"))
        .stdout(predicate::str::contains("--mysqlPassword"))
        .stdout(predicate::str::contains("--mysqlDatabase"))
        .stdout(predicate::str::contains("--mysqlHost"))
        .stdout(predicate::str::contains("--mysqlPort"));
}

#[test]
fn test_help_shows_switches() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--schemaOnly"))
        .stdout(predicate::str::contains("--logQuery"))
        .stdout(predicate::str::contains("--validate"))
        .stdout(predicate::str::contains("--outputJson"));
}

#[test]
fn test_short_help_flag() {
    cmd()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mysql2sqlite"));
}

#[test]
fn test_help_exits_zero_even_with_other_flags() {
    cmd()
        .args(["--mysqlDatabase=shop", "--help"])
        .assert()
        .code(0)
        .stderr(predicate::str::is_empty());
}

// =============================================================================
// Global Flags Tests
// =============================================================================

#[test]
fn test_log_format_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--logFormat"))
        .stdout(predicate::str::contains("[default: text]"));
}

#[test]
fn test_verbosity_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--verbosity"))
        .stdout(predicate::str::contains("[default: info]"));
}

// =============================================================================
// Argument Errors (Exit Code 1)
// =============================================================================

#[test]
fn test_no_arguments_prints_usage_to_stderr() {
    cmd()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_unknown_flag_fails() {
    cmd()
        .arg("--noSuchFlag=1")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--noSuchFlag"));
}

#[test]
fn test_bad_switch_value_fails() {
    cmd()
        .args(["--sqliteFile=out.db", "--mysqlDatabase=shop", "--schemaOnly=maybe"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("expected 0 or 1"));
}

#[test]
fn test_bad_port_fails() {
    cmd()
        .args(["--sqliteFile=out.db", "--mysqlDatabase=shop", "--mysqlPort=notaport"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--mysqlPort"));
}

// =============================================================================
// Exit Code Tests - Config Errors (Exit Code 1)
// =============================================================================

#[test]
fn test_missing_database_exits_with_code_1() {
    cmd()
        .arg("--sqliteFile=out.db")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--mysqlDatabase"));
}

#[test]
fn test_missing_sqlite_file_exits_with_code_1() {
    cmd()
        .arg("--mysqlDatabase=shop")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--sqliteFile"));
}

#[test]
fn test_directory_target_exits_with_code_1() {
    let dir = tempfile::tempdir().unwrap();
    cmd()
        .arg(format!("--sqliteFile={}", dir.path().display()))
        .arg("--mysqlDatabase=shop")
        .assert()
        .code(1);
}

#[test]
fn test_invalid_yaml_exits_with_code_1() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "invalid: yaml: content: [").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap()])
        .assert()
        .code(1); // EXIT_CONFIG_ERROR
}

#[test]
fn test_incomplete_yaml_exits_with_code_1() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    // Valid YAML but no database or target file
    writeln!(file, "source:").unwrap();
    writeln!(file, "  host: db.internal").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap()])
        .assert()
        .code(1); // EXIT_CONFIG_ERROR
}

// =============================================================================
// Exit Code Tests - IO Errors (Exit Code 7)
// =============================================================================

#[test]
fn test_missing_config_exits_with_code_7() {
    // Missing file is an IO error (code 7), not config error (code 1)
    cmd()
        .args(["--config", "nonexistent_config_file.yaml"])
        .assert()
        .code(7); // EXIT_IO_ERROR - file not found
}

// =============================================================================
// Exit Code Tests - Source Errors (Exit Code 2)
// =============================================================================

#[test]
fn test_unreachable_source_exits_with_code_2() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.db");

    // Port 1 on localhost refuses connections immediately.
    cmd()
        .arg(format!("--sqliteFile={}", target.display()))
        .args(["--mysqlDatabase=shop", "--mysqlHost=127.0.0.1", "--mysqlPort=1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("MySQL"));

    // The source is opened first, so the target file is never touched.
    assert!(!target.exists());
}
