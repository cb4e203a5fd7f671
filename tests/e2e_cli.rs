//! CLI end-to-end tests
//!
//! Tests for the reelpress command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the reelpress binary
#[allow(deprecated)]
fn reelpress_cmd() -> Command {
    Command::cargo_bin("reelpress").unwrap()
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = reelpress_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = reelpress_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("reelpress"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_flag() {
    let mut cmd = reelpress_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("reelpress"));
}

#[test]
fn test_cli_check_tools_command() {
    let mut cmd = reelpress_cmd();
    cmd.arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg"))
        .stdout(predicate::str::contains("Negotiated output type: video/"));
}

#[test]
fn test_cli_compress_help() {
    let mut cmd = reelpress_cmd();
    cmd.args(["compress", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Compress a video file"))
        .stdout(predicate::str::contains("--target-mb"));
}

#[test]
fn test_cli_probe_help() {
    let mut cmd = reelpress_cmd();
    cmd.args(["probe", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Probe a media file"));
}

#[test]
fn test_cli_compress_nonexistent_file() {
    let mut cmd = reelpress_cmd();
    cmd.args(["compress", "/nonexistent/clip.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cli_compress_rejects_unknown_quality() {
    let mut cmd = reelpress_cmd();
    cmd.args(["compress", "clip.mp4", "--quality", "ultra"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown quality tier"));
}

#[test]
fn test_cli_compress_small_file_passes_through() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("tiny.mp4");
    fs::write(&input, b"not really a video").unwrap();
    let out_dir = dir.path().join("out");

    let mut cmd = reelpress_cmd();
    let output = cmd
        .arg("compress")
        .arg(&input)
        .arg("--output-dir")
        .arg(&out_dir)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["tier"], "passthrough");
    assert_eq!(report["compression_ratio"], 1.0);
    assert_eq!(report["quality_score"], 10);
    assert_eq!(
        fs::read(out_dir.join("tiny.mp4")).unwrap(),
        b"not really a video"
    );
}

#[test]
fn test_cli_validate_defaults() {
    let mut cmd = reelpress_cmd();
    cmd.arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("using defaults"))
        .stdout(predicate::str::contains("20971520"))
        .stdout(predicate::str::contains("balanced"));
}

#[test]
fn test_cli_validate_reports_warnings() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("reelpress.json");
    fs::write(
        &path,
        r#"{"compression": {"target_size_bytes": 0, "quality_tier": "fast"}}"#,
    )
    .unwrap();

    let mut cmd = reelpress_cmd();
    cmd.arg("validate")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("fast"))
        .stdout(predicate::str::contains("target_size_bytes is 0"));
}

#[test]
fn test_cli_validate_invalid_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();

    let mut cmd = reelpress_cmd();
    cmd.arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("config parse error"));
}
