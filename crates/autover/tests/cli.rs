//! End-to-end CLI integration tests
//!
//! These tests invoke the compiled binary as a subprocess to verify
//! that the CLI behaves correctly from a user's perspective.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Returns a Command configured to run our binary, logging to the temp dir.
#[allow(deprecated)]
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
    cmd.env("AUTOVER_LOG_DIR", std::env::temp_dir());
    cmd
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON")
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_shows_usage() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("plan"));
}

#[test]
fn long_help_lists_environment() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("AUTOVER_LOG_DIR"));
}

#[test]
fn version_flag_shows_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

// =============================================================================
// Info Command
// =============================================================================

#[test]
fn info_shows_package_name_and_version() {
    cmd()
        .args(["-C", "/tmp", "info"])
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_NAME")))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn info_json_reports_manifest_version() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("package.json"),
        r#"{"name": "web", "version": "2.3.5"}"#,
    )
    .unwrap();

    let assert = cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info", "--json"])
        .assert()
        .success();

    let json = stdout_json(assert.get_output());
    assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
    assert_eq!(json["manifest"]["version"], "2.3.5");
    assert_eq!(json["config"]["settings"]["remote"], "origin");
    assert_eq!(json["config"]["settings"]["release_branch"], "release");
}

// =============================================================================
// Plan Command
// =============================================================================

#[test]
fn plan_from_explicit_base() {
    let tmp = TempDir::new().unwrap();
    let assert = cmd()
        .args(["-C", tmp.path().to_str().unwrap()])
        .args(["plan", "--base", "2.3.5", "--json"])
        .assert()
        .success();

    let json = stdout_json(assert.get_output());
    assert_eq!(json["versions"]["base"], "2.3.5");
    assert_eq!(json["versions"]["master_next"], "2.4.0");
    assert_eq!(json["versions"]["master_next_snapshot"], "2.4.1-SNAPSHOT");
    assert_eq!(json["versions"]["release"], "2.5.0-SNAPSHOT");
    assert_eq!(json["tag"], "v2.4.0");
    assert_eq!(json["branches"]["hotfix"], "hotfix/2.4.x");
    assert_eq!(json["branches"]["previous_hotfix"], "hotfix/2.3.x");
    assert_eq!(json["branches"]["dev"], "dev/2.5.x");
    assert_eq!(json["branches"]["previous_dev"], "dev/2.4.x");
}

#[test]
fn plan_reads_manifest_when_base_omitted() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("package.json"), r#"{"version": "v1.9.0"}"#).unwrap();

    let assert = cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "--json", "plan"])
        .assert()
        .success();

    let json = stdout_json(assert.get_output());
    assert_eq!(json["versions"]["master_next"], "1.10.0");
    assert_eq!(json["versions"]["release"], "1.11.0-SNAPSHOT");
}

#[test]
fn plan_text_output_names_branches() {
    cmd()
        .args(["--color", "never", "plan", "--base", "0.9.3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("v0.10.0"))
        .stdout(predicate::str::contains("hotfix/0.10.x"))
        .stdout(predicate::str::contains("dev/0.11.x"));
}

#[test]
fn plan_rejects_invalid_base() {
    cmd()
        .args(["plan", "--base", "2.3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --base"));
}

#[test]
fn plan_rejects_unsupported_prerelease() {
    cmd()
        .args(["plan", "--base", "2.3.5-beta.1"])
        .assert()
        .failure();
}

#[test]
fn plan_rejects_base_that_cannot_advance() {
    cmd()
        .args(["plan", "--base", "1.18446744073709551615.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot derive the next versions"));
}

#[test]
fn plan_without_manifest_fails() {
    let tmp = TempDir::new().unwrap();
    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "plan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read the current version"));
}

// =============================================================================
// Run Command
// =============================================================================

#[test]
fn run_help_shows_options() {
    cmd()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--base"));
}

#[test]
fn run_outside_repository_fails() {
    let tmp = TempDir::new().unwrap();
    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "run"])
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("not inside a git repository")
                .or(predicate::str::contains("git not found")),
        );
}

#[test]
fn dry_run_without_terminal_aborts_at_confirm() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("package.json"), r#"{"version": "2.3.5"}"#).unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "run", "--dry-run"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("aborted at confirm"));

    let manifest = fs::read_to_string(tmp.path().join("package.json")).unwrap();
    assert!(manifest.contains("2.3.5"));
}

// =============================================================================
// Global Flags
// =============================================================================

#[test]
fn quiet_and_verbose_flags_accepted() {
    for flag in ["-q", "--quiet", "-v", "-vv", "--verbose"] {
        cmd().args([flag, "-C", "/tmp", "info"]).assert().success();
    }
}

#[test]
fn color_choices_accepted() {
    for choice in ["auto", "always", "never"] {
        cmd()
            .args(["--color", choice, "-C", "/tmp", "info"])
            .assert()
            .success();
    }
}

#[test]
fn log_path_override_writes_jsonl() {
    let tmp = TempDir::new().unwrap();
    let log = tmp.path().join("autover.jsonl");

    cmd()
        .env("AUTOVER_LOG_PATH", &log)
        .args(["-v", "plan", "--base", "1.0.0"])
        .assert()
        .success();

    assert!(log.exists());
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn invalid_subcommand_shows_error() {
    cmd()
        .arg("not-a-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn chdir_nonexistent_fails() {
    cmd()
        .args(["-C", "/nonexistent/path/that/does/not/exist", "info"])
        .assert()
        .failure();
}
