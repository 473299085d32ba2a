//! The manifest holding the project's current version.
//!
//! The workflow only needs to read and overwrite a single `version` field.
//! [`PackageJson`] does that for a `package.json`-style file, leaving every
//! other key untouched and in its original order.

use std::cell::RefCell;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::version::Version;

/// Default manifest file name.
pub const DEFAULT_MANIFEST: &str = "package.json";

/// Errors from manifest access.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Reading or writing the file failed.
    #[error("failed to access {path}: {source}")]
    Io {
        /// The manifest path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("failed to parse {path}: {source}")]
    Json {
        /// The manifest path.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The top-level JSON value is not an object.
    #[error("{path} must contain a JSON object")]
    NotAnObject {
        /// The manifest path.
        path: Utf8PathBuf,
    },

    /// No string `version` field at the top level.
    #[error("{path} has no string \"version\" field")]
    MissingVersion {
        /// The manifest path.
        path: Utf8PathBuf,
    },
}

/// Result alias for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Persistent storage for the current version.
pub trait VersionStore {
    /// Path staged with `git add` after a write.
    fn path(&self) -> &Utf8Path;

    /// Read the raw version string.
    fn read_version(&self) -> ManifestResult<String>;

    /// Overwrite the stored version.
    fn write_version(&self, version: &Version) -> ManifestResult<()>;
}

impl<S: VersionStore + ?Sized> VersionStore for &S {
    fn path(&self) -> &Utf8Path {
        (**self).path()
    }

    fn read_version(&self) -> ManifestResult<String> {
        (**self).read_version()
    }

    fn write_version(&self, version: &Version) -> ManifestResult<()> {
        (**self).write_version(version)
    }
}

// ──────────────────────────────────────────────
// package.json
// ──────────────────────────────────────────────

/// A JSON manifest with a top-level `version` field.
#[derive(Debug, Clone)]
pub struct PackageJson {
    path: Utf8PathBuf,
}

impl PackageJson {
    /// Use the manifest at `path`.
    pub fn new<P: AsRef<Utf8Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn load(&self) -> ManifestResult<serde_json::Map<String, Value>> {
        let text = fs::read_to_string(&self.path).map_err(|source| ManifestError::Io {
            path: self.path.clone(),
            source,
        })?;
        let value: Value = serde_json::from_str(&text).map_err(|source| ManifestError::Json {
            path: self.path.clone(),
            source,
        })?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(ManifestError::NotAnObject {
                path: self.path.clone(),
            }),
        }
    }
}

impl VersionStore for PackageJson {
    fn path(&self) -> &Utf8Path {
        &self.path
    }

    #[instrument(skip_all, fields(path = %self.path))]
    fn read_version(&self) -> ManifestResult<String> {
        let map = self.load()?;
        let version = map
            .get("version")
            .and_then(Value::as_str)
            .ok_or_else(|| ManifestError::MissingVersion {
                path: self.path.clone(),
            })?;
        debug!(%version, "read manifest version");
        Ok(version.to_string())
    }

    /// Rewrites the file pretty-printed with two-space indentation and a
    /// trailing newline.
    #[instrument(skip_all, fields(path = %self.path, version = %version))]
    fn write_version(&self, version: &Version) -> ManifestResult<()> {
        let mut map = self.load()?;
        map.insert("version".to_string(), Value::String(version.to_string()));

        let mut text = serde_json::to_string_pretty(&Value::Object(map)).map_err(|source| {
            ManifestError::Json {
                path: self.path.clone(),
                source,
            }
        })?;
        text.push('\n');

        fs::write(&self.path, text).map_err(|source| ManifestError::Io {
            path: self.path.clone(),
            source,
        })?;
        info!("manifest version written");
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Dry run
// ──────────────────────────────────────────────

/// Reads through to an inner store and discards writes.
#[derive(Debug)]
pub struct DryRunStore<S> {
    inner: S,
    discarded: RefCell<Vec<Version>>,
}

impl<S: VersionStore> DryRunStore<S> {
    /// Wrap `inner`.
    pub const fn new(inner: S) -> Self {
        Self {
            inner,
            discarded: RefCell::new(Vec::new()),
        }
    }

    /// Versions that would have been written, in order.
    pub fn discarded(&self) -> Vec<Version> {
        self.discarded.borrow().clone()
    }
}

impl<S: VersionStore> VersionStore for DryRunStore<S> {
    fn path(&self) -> &Utf8Path {
        self.inner.path()
    }

    fn read_version(&self) -> ManifestResult<String> {
        self.inner.read_version()
    }

    fn write_version(&self, version: &Version) -> ManifestResult<()> {
        debug!(path = %self.inner.path(), %version, "dry run: would write manifest");
        self.discarded.borrow_mut().push(*version);
        Ok(())
    }
}
