//! Integration tests for the harvester command line.
//!
//! None of these reach the crawl itself, so no network access is needed.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

// Helper function to create a clean command instance
fn harvester() -> Command { Command::cargo_bin("harvester").unwrap() }

#[test]
fn test_help() {
  harvester()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("--start"))
    .stdout(predicate::str::contains("--config"));
}

#[test]
fn test_version() {
  harvester().arg("--version").assert().success().stdout(predicate::str::contains("harvester"));
}

#[test]
fn test_rejects_invalid_start_month() {
  harvester()
    .args(["--start", "2024-13"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("invalid value"));

  harvester().args(["--start", "December"]).assert().failure();
}

#[test]
fn test_missing_config_file() {
  let dir = tempdir().unwrap();

  harvester()
    .arg("--config")
    .arg(dir.path().join("missing.toml"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_invalid_config_file() {
  let dir = tempdir().unwrap();
  let path = dir.path().join("harvester.toml");
  std::fs::write(&path, "batch_size = 0\n").unwrap();

  harvester()
    .arg("--config")
    .arg(&path)
    .assert()
    .failure()
    .stderr(predicate::str::contains("batch_size must be greater than zero"));
}
