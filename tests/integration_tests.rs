//! Integration tests for the taskman CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn taskman() -> Command {
    let mut cmd = Command::cargo_bin("taskman").unwrap();
    // Keep the environment from leaking into configuration
    cmd.env_remove("TASKMAN_MAX_WORKERS")
        .env_remove("TASKMAN_THREAD_PERCENTAGE")
        .env_remove("TASKMAN_SHOW_PROGRESS")
        .env_remove("RUST_LOG");
    cmd
}

/// Build `root/{a.txt, one/{b.txt, two/{c.txt, d.txt}}}`
fn sample_tree() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("a.txt"), "a").unwrap();
    fs::create_dir_all(root.join("one/two")).unwrap();
    fs::write(root.join("one/b.txt"), "b").unwrap();
    fs::write(root.join("one/two/c.txt"), "c").unwrap();
    fs::write(root.join("one/two/d.txt"), "d").unwrap();
    temp_dir
}

/// Test CLI binary exists and responds to --help
#[test]
fn test_cli_help() {
    taskman()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dynamic work-queue executor"));
}

/// Test CLI responds to --version
#[test]
fn test_cli_version() {
    taskman()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("taskman"))
        .stdout(predicate::str::contains(taskman::VERSION));
}

/// Test invalid subcommand shows error
#[test]
fn test_invalid_subcommand() {
    taskman()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

/// Directory expansion adds one task per child and counts everything
#[test]
fn test_scan_json_counts_tree() {
    let tree = sample_tree();

    let output = taskman()
        .current_dir(tree.path())
        .args(["scan", ".", "--format", "json", "-j", "2"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["directories"], 3);
    assert_eq!(summary["files"], 4);
    assert_eq!(summary["max_depth"], 2);
    assert_eq!(summary["tasks_submitted"], 7);
    assert_eq!(summary["tasks_completed"], 7);
    assert_eq!(summary["truncated"], false);
}

#[test]
fn test_scan_text_summary() {
    let tree = sample_tree();

    taskman()
        .arg("scan")
        .arg(tree.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Scan finished: 7 tasks"))
        .stdout(predicate::str::contains("directories"));
}

/// Breaking out of the stream early shuts the pool down cleanly
#[test]
fn test_scan_limit_truncates() {
    let tree = sample_tree();

    let output = taskman()
        .current_dir(tree.path())
        .args(["scan", ".", "--format", "json", "--limit", "1"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["directories"], 1);
    assert_eq!(summary["truncated"], true);
}

#[test]
fn test_scan_missing_path_reports_failure() {
    let temp_dir = TempDir::new().unwrap();

    let output = taskman()
        .current_dir(temp_dir.path())
        .args(["scan", "does-not-exist", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["failures"], 1);
    assert_eq!(summary["directories"], 0);
}

/// Each page discovers the next one from inside the result loop
#[test]
fn test_pages_follow_next_links() {
    taskman()
        .args(["pages", "4", "--per-page", "3", "--delay-ms", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fetched 4 pages, 12 items"))
        .stdout(predicate::str::contains("item-1-1"));
}

#[test]
fn test_pages_failure_stops_discovery() {
    taskman()
        .args(["pages", "5", "--delay-ms", "1", "--fail-page", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fetched 2 pages, 10 items"))
        .stderr(predicate::str::contains("Page-3"));
}

#[test]
fn test_pages_rejects_zero() {
    taskman().args(["pages", "0"]).assert().failure();
}

/// Configuration file is honoured
#[test]
fn test_custom_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("taskman.toml");
    fs::write(&config_path, "max_workers = 1\nshow_progress = false\n").unwrap();

    taskman()
        .current_dir(temp_dir.path())
        .args(["-v", "pages", "2", "--delay-ms", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fetched 2 pages"))
        .stderr(predicate::str::contains("progress").not());
}

#[test]
fn test_invalid_config_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("bad.toml");
    fs::write(&config_path, "thread_percentage = 0\n").unwrap();

    taskman()
        .arg("--config")
        .arg(&config_path)
        .args(["pages", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("thread_percentage"));
}
