//! Info command: show package, config, and manifest information.

use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use autover_core::config::{self, Config};
use autover_core::git::git_binary;
use autover_core::lifecycle::ReleaseSettings;
use autover_core::manifest::{PackageJson, VersionStore};

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct PackageInfo {
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    repository: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    homepage: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    license: &'static str,
}

impl PackageInfo {
    const fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            description: env!("CARGO_PKG_DESCRIPTION"),
            repository: env!("CARGO_PKG_REPOSITORY"),
            homepage: env!("CARGO_PKG_HOMEPAGE"),
            license: env!("CARGO_PKG_LICENSE"),
        }
    }
}

#[derive(Serialize)]
struct ConfigInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<String>,
    log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_dir: Option<String>,
    settings: ReleaseSettings,
}

impl ConfigInfo {
    fn from_config(config: &Config, cwd: &camino::Utf8Path) -> Self {
        Self {
            config_file: config::find_project_config(cwd).map(|p| p.to_string()),
            log_level: config.log_level.as_str().to_string(),
            log_dir: config.log_dir.as_ref().map(|p| p.to_string()),
            settings: ReleaseSettings::from_config(config),
        }
    }
}

#[derive(Serialize)]
struct ManifestInfo {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ManifestInfo {
    fn read(config: &Config, cwd: &camino::Utf8Path) -> Self {
        let path = cwd.join(config.manifest_path());
        let (version, error) = match PackageJson::new(&path).read_version() {
            Ok(version) => (Some(version), None),
            Err(err) => (None, Some(err.to_string())),
        };
        Self {
            path: path.to_string(),
            version,
            error,
        }
    }
}

#[derive(Serialize)]
struct FullInfo {
    #[serde(flatten)]
    package: PackageInfo,
    config: ConfigInfo,
    manifest: ManifestInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    git: Option<String>,
}

/// Print package information.
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `config` - Loaded configuration
/// * `cwd` - Current working directory for config discovery and manifest lookup
#[instrument(name = "cmd_info", skip_all, fields(json_output))]
pub fn cmd_info(
    _args: InfoArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing info command");

    let full_info = FullInfo {
        package: PackageInfo::new(),
        config: ConfigInfo::from_config(config, cwd),
        manifest: ManifestInfo::read(config, cwd),
        git: git_binary().map(|p| p.display().to_string()),
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&full_info)?);
        return Ok(());
    }

    println!(
        "{} {}",
        full_info.package.name.bold(),
        full_info.package.version.green()
    );
    if !full_info.package.description.is_empty() {
        println!("{}", full_info.package.description);
    }
    if !full_info.package.license.is_empty() {
        println!("{}: {}", "License".dimmed(), full_info.package.license);
    }
    if !full_info.package.repository.is_empty() {
        println!(
            "{}: {}",
            "Repository".dimmed(),
            full_info.package.repository.cyan()
        );
    }

    // Configuration section
    let cfg = &full_info.config;
    println!();
    println!("{}", "Configuration".bold().underline());
    if let Some(ref path) = cfg.config_file {
        println!("{}: {}", "Config file".dimmed(), path.cyan());
    } else {
        println!("{}: {}", "Config file".dimmed(), "none loaded".yellow());
    }
    println!("{}: {}", "Log level".dimmed(), cfg.log_level);
    if let Some(ref dir) = cfg.log_dir {
        println!("{}: {}", "Log directory".dimmed(), dir);
    }
    println!("{}: {}", "Remote".dimmed(), cfg.settings.remote.cyan());
    println!(
        "{}: {}",
        "Release branch".dimmed(),
        cfg.settings.release_branch.cyan()
    );
    println!(
        "{}: {}",
        "Hotfix prefix".dimmed(),
        cfg.settings.naming.hotfix_prefix.cyan()
    );
    println!(
        "{}: {}",
        "Dev prefix".dimmed(),
        cfg.settings.naming.dev_prefix.cyan()
    );

    // Manifest section
    let manifest = &full_info.manifest;
    println!();
    println!("{}", "Manifest".bold().underline());
    println!("{}: {}", "Path".dimmed(), manifest.path);
    match (&manifest.version, &manifest.error) {
        (Some(version), _) => println!("{}: {}", "Version".dimmed(), version.green()),
        (None, Some(error)) => println!("  {} {}", "○".yellow(), error.yellow()),
        (None, None) => {}
    }

    println!();
    match full_info.git {
        Some(ref path) => println!("{}: {}", "git".dimmed(), path),
        None => println!("  {} {}", "✗".red(), "git not found on PATH".red()),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn test_cwd() -> camino::Utf8PathBuf {
        camino::Utf8PathBuf::from("/tmp")
    }

    #[test]
    fn test_cmd_info_text_succeeds() {
        assert!(cmd_info(InfoArgs::default(), false, &Config::default(), &test_cwd()).is_ok());
    }

    #[test]
    fn test_cmd_info_json_via_global() {
        assert!(cmd_info(InfoArgs::default(), true, &Config::default(), &test_cwd()).is_ok());
    }

    #[test]
    fn test_config_info_no_file() {
        let cwd = camino::Utf8PathBuf::from("/nonexistent");
        let info = ConfigInfo::from_config(&Config::default(), &cwd);
        assert!(info.config_file.is_none());
        assert_eq!(info.log_level, "info");
        assert_eq!(info.settings.remote, "origin");
    }

    #[test]
    fn test_manifest_info_reads_version() {
        let tmp = tempfile::tempdir().unwrap();
        let cwd = camino::Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        fs::write(cwd.join("package.json"), r#"{"version": "2.3.5"}"#).unwrap();

        let info = ManifestInfo::read(&Config::default(), &cwd);
        assert_eq!(info.version.as_deref(), Some("2.3.5"));
        assert!(info.error.is_none());
    }

    #[test]
    fn test_manifest_info_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let cwd = camino::Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();

        let info = ManifestInfo::read(&Config::default(), &cwd);
        assert!(info.version.is_none());
        assert!(info.error.is_some());
    }
}
