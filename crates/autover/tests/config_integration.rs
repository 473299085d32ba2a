//! Configuration integration tests.
//!
//! These tests verify config discovery, format parsing, and precedence
//! from an end-to-end perspective using the compiled binary. `plan --json`
//! and `info --json` expose the resolved settings, so each test checks which
//! file actually won.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Returns a Command configured to run our binary, logging to the temp dir.
#[allow(deprecated)]
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
    cmd.env("AUTOVER_LOG_DIR", std::env::temp_dir());
    cmd
}

/// Run `plan --json` from `dir` and return the parsed report.
fn plan_in(dir: &Path, extra: &[&str]) -> serde_json::Value {
    let assert = cmd()
        .args(["-C", dir.to_str().unwrap()])
        .args(extra)
        .args(["--json", "plan", "--base", "2.3.5"])
        .assert()
        .success();
    serde_json::from_slice(&assert.get_output().stdout).expect("plan --json should be JSON")
}

/// Run `info --json` from `dir` and return the parsed report.
fn info_in(dir: &Path) -> serde_json::Value {
    let assert = cmd()
        .args(["-C", dir.to_str().unwrap(), "--json", "info"])
        .assert()
        .success();
    serde_json::from_slice(&assert.get_output().stdout).expect("info --json should be JSON")
}

// =============================================================================
// Config File Discovery
// =============================================================================

#[test]
fn runs_without_config_file() {
    let tmp = TempDir::new().unwrap();
    let plan = plan_in(tmp.path(), &[]);
    assert_eq!(plan["remote"], "origin");
    assert_eq!(plan["branches"]["hotfix"], "hotfix/2.4.x");
}

#[test]
fn discovers_dotfile_config_in_current_dir() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".autover.toml"),
        "[git]\nhotfix_prefix = \"maint/\"\n",
    )
    .unwrap();

    let plan = plan_in(tmp.path(), &[]);
    assert_eq!(plan["branches"]["hotfix"], "maint/2.4.x");
    assert_eq!(plan["branches"]["previous_hotfix"], "maint/2.3.x");
}

#[test]
fn discovers_config_in_parent_directory() {
    let tmp = TempDir::new().unwrap();
    let nested = tmp.path().join("nested").join("deep");
    fs::create_dir_all(&nested).unwrap();
    fs::write(
        tmp.path().join("autover.toml"),
        "[git]\nremote = \"upstream\"\n",
    )
    .unwrap();

    let plan = plan_in(&nested, &[]);
    assert_eq!(plan["remote"], "upstream");
}

#[test]
fn dotfile_takes_precedence_over_regular_name() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".autover.toml"),
        "[git]\ndev_prefix = \"next/\"\n",
    )
    .unwrap();
    fs::write(
        tmp.path().join("autover.toml"),
        "[git]\ndev_prefix = \"ignored/\"\n",
    )
    .unwrap();

    let plan = plan_in(tmp.path(), &[]);
    assert_eq!(plan["branches"]["dev"], "next/2.5.x");
}

#[test]
fn info_reports_discovered_config_file() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".autover.toml"), r#"log_level = "warn""#).unwrap();

    let info = info_in(tmp.path());
    let config_file = info["config"]["config_file"].as_str().unwrap();
    assert!(config_file.ends_with(".autover.toml"));
    assert_eq!(info["config"]["log_level"], "warn");
}

// =============================================================================
// Config Format Parsing
// =============================================================================

#[test]
fn parses_yaml_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".autover.yaml"),
        "git:\n  release_branch: stable\n",
    )
    .unwrap();

    let plan = plan_in(tmp.path(), &[]);
    assert_eq!(plan["release_branch"], "stable");
}

#[test]
fn parses_yml_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".autover.yml"), "log_level: debug\n").unwrap();

    assert_eq!(info_in(tmp.path())["config"]["log_level"], "debug");
}

#[test]
fn parses_json_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".autover.json"),
        r#"{"git": {"remote": "fork"}}"#,
    )
    .unwrap();

    assert_eq!(plan_in(tmp.path(), &[])["remote"], "fork");
}

#[test]
fn manifest_path_from_config() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("web")).unwrap();
    fs::write(
        tmp.path().join("web").join("package.json"),
        r#"{"version": "4.0.2"}"#,
    )
    .unwrap();
    fs::write(
        tmp.path().join(".autover.toml"),
        "[manifest]\npath = \"web/package.json\"\n",
    )
    .unwrap();

    let assert = cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "--json", "plan"])
        .assert()
        .success();
    let plan: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(plan["versions"]["master_next"], "4.1.0");
}

// =============================================================================
// Config Precedence
// =============================================================================

#[test]
fn closer_config_takes_precedence() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path().join("project");
    fs::create_dir_all(&project).unwrap();
    fs::write(
        tmp.path().join(".autover.toml"),
        "[git]\nremote = \"outer\"\n",
    )
    .unwrap();
    fs::write(project.join(".autover.toml"), "[git]\nremote = \"inner\"\n").unwrap();

    assert_eq!(plan_in(&project, &[])["remote"], "inner");
}

#[test]
fn toml_preferred_over_yaml_in_same_directory() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".autover.toml"), "[git]\nremote = \"toml\"\n").unwrap();
    fs::write(tmp.path().join(".autover.yaml"), "git:\n  remote: yaml\n").unwrap();

    assert_eq!(plan_in(tmp.path(), &[])["remote"], "toml");
}

#[test]
fn explicit_config_overrides_discovered() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".autover.toml"), "[git]\nremote = \"found\"\n").unwrap();
    let explicit = tmp.path().join("ci.toml");
    fs::write(
        &explicit,
        "[git]\nhotfix_prefix = \"support/\"\n",
    )
    .unwrap();

    let plan = plan_in(tmp.path(), &["--config", explicit.to_str().unwrap()]);
    assert_eq!(plan["remote"], "found");
    assert_eq!(plan["branches"]["hotfix"], "support/2.4.x");
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn invalid_toml_config_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".autover.toml"), "this is not valid toml [[[").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn invalid_json_config_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".autover.json"), "{not valid json}").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure();
}

#[test]
fn wrong_value_type_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".autover.toml"),
        "[cleanup]\ndelete_previous_dev = \"sometimes\"\n",
    )
    .unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure();
}

#[test]
fn unknown_config_field_is_ignored() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".autover.toml"),
        "log_level = \"info\"\nunknown_field = \"ignored\"\n",
    )
    .unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .success();
}

#[test]
fn missing_explicit_config_fails() {
    cmd()
        .args(["--config", "/nonexistent/autover.toml", "info"])
        .assert()
        .failure();
}

// =============================================================================
// Boundary Marker Tests
// =============================================================================

#[test]
fn git_boundary_stops_config_search() {
    let tmp = TempDir::new().unwrap();
    let parent = tmp.path().join("parent");
    let repo = parent.join("repo");
    let src = repo.join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(parent.join(".autover.toml"), "[git]\nremote = \"outside\"\n").unwrap();
    fs::create_dir(repo.join(".git")).unwrap();

    assert_eq!(plan_in(&src, &[])["remote"], "origin");
}

#[test]
fn config_in_same_dir_as_git_is_found() {
    let tmp = TempDir::new().unwrap();
    let repo = tmp.path().join("repo");
    let src = repo.join("src");
    fs::create_dir_all(&src).unwrap();
    fs::create_dir(repo.join(".git")).unwrap();
    fs::write(repo.join(".autover.toml"), "[git]\nremote = \"repo\"\n").unwrap();

    assert_eq!(plan_in(&src, &[])["remote"], "repo");
}
