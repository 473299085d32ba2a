//! Configuration loading and discovery.
//!
//! Sources are merged lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. `~/.config/autover/config.<ext>` (user config)
//! 3. `.autover.<ext>` or `autover.<ext>` in the working directory or the
//!    nearest parent, stopping at a `.git` boundary
//! 4. Files passed explicitly (`--config`), in order
//!
//! `<ext>` is one of `toml`, `yaml`, `yml`, `json`.
//!
//! # Example
//! ```no_run
//! use camino::Utf8PathBuf;
//! use autover_core::config::ConfigLoader;
//!
//! let cwd = Utf8PathBuf::from("/work/web-app");
//! let config = ConfigLoader::new()
//!     .with_project_search(&cwd)
//!     .load()
//!     .unwrap();
//! println!("manifest: {}", config.manifest_path());
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::manifest::DEFAULT_MANIFEST;

/// The configuration for autover.
///
/// Every section is optional; unset values fall back to the defaults of
/// the release workflow.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Log level (`debug`, `info`, `warn`, `error`).
    pub log_level: LogLevel,
    /// Directory for JSONL log files (falls back to platform defaults if unset).
    pub log_dir: Option<Utf8PathBuf>,
    /// Where the version lives.
    pub manifest: Option<ManifestConfig>,
    /// Remote, branch, and commit conventions.
    pub git: Option<GitConfig>,
    /// Default answers for the stale-branch cleanup prompts.
    pub cleanup: Option<CleanupConfig>,
}

/// Manifest location.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ManifestConfig {
    /// Path to the manifest, relative to the working directory
    /// (default: `package.json`).
    pub path: Option<Utf8PathBuf>,
}

/// Git conventions used by the release workflow.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct GitConfig {
    /// Remote to push to (default: `origin`).
    pub remote: Option<String>,
    /// Name of the long-lived release branch (default: `release`).
    pub release_branch: Option<String>,
    /// Prefix for hotfix branches (default: `hotfix/`).
    pub hotfix_prefix: Option<String>,
    /// Prefix for dev branches (default: `dev/`).
    pub dev_prefix: Option<String>,
    /// Commit message for version bumps. `{version}` is replaced with the
    /// new version.
    pub commit_message: Option<String>,
}

/// Default answers for the cleanup prompts.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CleanupConfig {
    /// Default for "delete the previous hotfix branch?" (default: `true`).
    pub delete_previous_hotfix: Option<bool>,
    /// Default for "delete the previous dev branch?" (default: `false`).
    pub delete_previous_dev: Option<bool>,
}

impl Config {
    /// The configured manifest path, or `package.json`.
    pub fn manifest_path(&self) -> Utf8PathBuf {
        self.manifest
            .as_ref()
            .and_then(|m| m.path.clone())
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_MANIFEST))
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose output for debugging.
    Debug,
    /// Standard operational information (default).
    #[default]
    Info,
    /// Warnings about potential issues.
    Warn,
    /// Failures only.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

const APP_NAME: &str = "autover";

/// Builder for loading configuration from multiple sources.
#[derive(Debug)]
pub struct ConfigLoader {
    project_search_root: Option<Utf8PathBuf>,
    include_user_config: bool,
    boundary_marker: Option<String>,
    explicit_files: Vec<Utf8PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a loader that includes user config and stops at `.git`.
    pub fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            boundary_marker: Some(".git".to_string()),
            explicit_files: Vec::new(),
        }
    }

    /// Walk up from `path` looking for a project config file.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Include or skip `~/.config/autover/config.<ext>`.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Stop the upward search at a parent directory containing `marker`.
    pub fn with_boundary_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.boundary_marker = Some(marker.into());
        self
    }

    /// Search all the way to the filesystem root.
    pub fn without_boundary_marker(mut self) -> Self {
        self.boundary_marker = None;
        self
    }

    /// Add an explicit config file. Later files win.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Every config file that [`load`](Self::load) would read, lowest
    /// precedence first.
    pub fn sources(&self) -> Vec<Utf8PathBuf> {
        let mut sources = Vec::new();
        if self.include_user_config
            && let Some(user) = find_user_config()
        {
            sources.push(user);
        }
        if let Some(ref root) = self.project_search_root
            && let Some(project) = self.find_project_config(root)
        {
            sources.push(project);
        }
        sources.extend(self.explicit_files.iter().cloned());
        sources
    }

    /// Load configuration, merging all discovered sources over the defaults.
    #[tracing::instrument(skip(self), fields(search_root = ?self.project_search_root))]
    pub fn load(self) -> ConfigResult<Config> {
        let sources = self.sources();
        tracing::debug!(?sources, "loading configuration");

        let figment = sources.iter().fold(
            Figment::new().merge(Serialized::defaults(Config::default())),
            |figment, path| merge_file(figment, path),
        );

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        tracing::info!(
            log_level = config.log_level.as_str(),
            manifest = %config.manifest_path(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Like [`load`](Self::load), but fail when no config file exists.
    pub fn load_or_error(self) -> ConfigResult<Config> {
        if self.sources().is_empty() {
            return Err(ConfigError::NotFound);
        }
        self.load()
    }

    fn find_project_config(&self, start: &Utf8Path) -> Option<Utf8PathBuf> {
        for dir in start.ancestors() {
            for ext in CONFIG_EXTENSIONS {
                for name in [format!(".{APP_NAME}.{ext}"), format!("{APP_NAME}.{ext}")] {
                    let candidate = dir.join(name);
                    if candidate.is_file() {
                        return Some(candidate);
                    }
                }
            }

            // the directory holding the marker is the last one searched
            if let Some(ref marker) = self.boundary_marker
                && dir.join(marker).exists()
            {
                break;
            }
        }
        None
    }
}

fn find_user_config() -> Option<Utf8PathBuf> {
    let config_dir = user_config_dir()?;
    CONFIG_EXTENSIONS
        .iter()
        .map(|ext| config_dir.join(format!("config.{ext}")))
        .find(|path| path.is_file())
}

fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
    match path.extension() {
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
        Some("json") => figment.merge(Json::file_exact(path.as_str())),
        _ => figment.merge(Toml::file_exact(path.as_str())),
    }
}

/// Find the project config file path without loading it.
pub fn find_project_config<P: AsRef<Utf8Path>>(start: P) -> Option<Utf8PathBuf> {
    ConfigLoader::new().find_project_config(start.as_ref())
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// The user config directory (`~/.config/autover/` on Linux).
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    let dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(dirs.config_dir().to_path_buf()).ok()
}

/// The machine-local data directory (`~/.local/share/autover/` on Linux).
pub fn user_data_local_dir() -> Option<Utf8PathBuf> {
    let dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(dirs.data_local_dir().to_path_buf()).ok()
}
