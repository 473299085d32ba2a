//! Version model and release-train derivation.
//!
//! A run starts from one operator-supplied base version and derives the
//! three versions the workflow writes:
//!
//! | Slot | Rule | `2.3.5` → |
//! |------|------|-----------|
//! | master-next | minor + 1, patch 0 | `2.4.0` |
//! | master-next snapshot | minor + 1, patch 1, snapshot | `2.4.1-SNAPSHOT` |
//! | release | minor + 2, patch 0, snapshot | `2.5.0-SNAPSHOT` |
//!
//! Derivation is a pure function of the base version. [`DerivedVersions`] is
//! built once and never mutated afterwards.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, instrument};

/// The only pre-release identifier a version may carry.
pub const SNAPSHOT_SUFFIX: &str = "SNAPSHOT";

/// Errors from version parsing and derivation.
#[derive(Error, Debug)]
pub enum VersionError {
    /// Not a `major.minor.patch` triple.
    #[error("invalid version `{input}`: {source}")]
    InvalidSemver {
        /// The rejected input.
        input: String,
        /// Underlying semver parse error.
        #[source]
        source: semver::Error,
    },

    /// Carries a pre-release identifier other than the snapshot marker.
    #[error("unsupported pre-release `{pre}` in `{input}` (only -{SNAPSHOT_SUFFIX} is allowed)")]
    UnsupportedPrerelease {
        /// The rejected input.
        input: String,
        /// The pre-release identifier found.
        pre: String,
    },

    /// Carries `+build` metadata.
    #[error("build metadata is not supported in `{input}`")]
    UnsupportedBuildMetadata {
        /// The rejected input.
        input: String,
    },

    /// The minor component cannot be advanced without wrapping.
    #[error("version `{input}` cannot be advanced: minor component overflows")]
    Overflow {
        /// The base version that could not be advanced.
        input: String,
    },
}

/// Result alias for version operations.
pub type VersionResult<T> = Result<T, VersionError>;

// ──────────────────────────────────────────────
// Version
// ──────────────────────────────────────────────

/// A `major.minor.patch` triple with an optional snapshot marker.
///
/// Serialized as its canonical string form (`"2.4.1-SNAPSHOT"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    /// Major component.
    pub major: u64,
    /// Minor component.
    pub minor: u64,
    /// Patch component.
    pub patch: u64,
    /// Whether the `-SNAPSHOT` marker is present.
    pub snapshot: bool,
}

impl Version {
    /// Create a plain (non-snapshot) version.
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            snapshot: false,
        }
    }

    /// Return a copy with the snapshot marker set or cleared.
    pub const fn with_snapshot(self, snapshot: bool) -> Self {
        Self { snapshot, ..self }
    }

    /// Return a copy without the snapshot marker.
    pub const fn release(self) -> Self {
        self.with_snapshot(false)
    }

    /// The annotated tag name for this version (`v2.4.0`).
    pub fn tag(&self) -> String {
        format!("v{self}")
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.snapshot {
            write!(f, "-{SNAPSHOT_SUFFIX}")?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_version(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_version(&raw).map_err(serde::de::Error::custom)
    }
}

/// Parse a version string, accepting an optional `v` prefix.
///
/// Surrounding whitespace is ignored. The only accepted pre-release is
/// `SNAPSHOT`; build metadata is rejected.
pub fn parse_version(input: &str) -> VersionResult<Version> {
    let trimmed = input.trim();
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);

    let parsed = semver::Version::parse(bare).map_err(|source| VersionError::InvalidSemver {
        input: input.to_string(),
        source,
    })?;

    if !parsed.build.is_empty() {
        return Err(VersionError::UnsupportedBuildMetadata {
            input: input.to_string(),
        });
    }

    let snapshot = match parsed.pre.as_str() {
        "" => false,
        SNAPSHOT_SUFFIX => true,
        other => {
            return Err(VersionError::UnsupportedPrerelease {
                input: input.to_string(),
                pre: other.to_string(),
            });
        }
    };

    Ok(Version {
        major: parsed.major,
        minor: parsed.minor,
        patch: parsed.patch,
        snapshot,
    })
}

// ──────────────────────────────────────────────
// Derivation
// ──────────────────────────────────────────────

/// Which line of development a derived version belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetBranch {
    /// The primary development line.
    Master,
    /// The following release train.
    Release,
}

impl fmt::Display for TargetBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Master => write!(f, "master"),
            Self::Release => write!(f, "release"),
        }
    }
}

/// Compute the next version for `branch` from `base`.
///
/// Master bumps the minor once; release bumps it twice. The patch is always
/// rebuilt from scratch, so a snapshot marker on `base` never leaks into the
/// result.
///
/// # Errors
///
/// Returns [`VersionError::Overflow`] when the bumped minor does not fit in
/// a `u64`.
pub fn compute_next(
    base: Version,
    branch: TargetBranch,
    snapshot: bool,
) -> VersionResult<Version> {
    let steps = match branch {
        TargetBranch::Master => 1,
        TargetBranch::Release => 2,
    };
    let minor = base
        .minor
        .checked_add(steps)
        .ok_or_else(|| VersionError::Overflow {
            input: base.to_string(),
        })?;
    let patch = match branch {
        TargetBranch::Master if snapshot => 1,
        _ => 0,
    };
    Ok(Version {
        major: base.major,
        minor,
        patch,
        snapshot,
    })
}

/// Names the four version slots of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionKey {
    /// The operator-supplied anchor.
    Base,
    /// Clean next-minor version tagged on master.
    MasterNext,
    /// In-progress version left on master after tagging.
    MasterNextSnapshot,
    /// Version written to the release branch.
    Release,
}

/// The four versions of one run, fixed once derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DerivedVersions {
    /// The anchor version.
    pub base: Version,
    /// Tagged on master.
    pub master_next: Version,
    /// Written back to master (and the hotfix branch) after tagging.
    pub master_next_snapshot: Version,
    /// Written to the release branch.
    pub release: Version,
}

impl DerivedVersions {
    /// Look up a slot by key.
    pub const fn get(&self, key: VersionKey) -> Version {
        match key {
            VersionKey::Base => self.base,
            VersionKey::MasterNext => self.master_next,
            VersionKey::MasterNextSnapshot => self.master_next_snapshot,
            VersionKey::Release => self.release,
        }
    }
}

/// Derive every slot from `base` using the default rules.
///
/// # Errors
///
/// Returns [`VersionError::Overflow`] when `base` is too close to the top of
/// the minor range to be advanced twice.
pub fn derive_all(base: Version) -> VersionResult<DerivedVersions> {
    VersionDeriver::new(base).finish()
}

/// Builder for [`DerivedVersions`] with optional per-slot overrides.
///
/// # Example
///
/// ```
/// use autover_core::version::{VersionDeriver, parse_version};
///
/// let base = parse_version("2.3.5").unwrap();
/// let versions = VersionDeriver::new(base).finish().unwrap();
/// assert_eq!(versions.master_next.to_string(), "2.4.0");
/// assert_eq!(versions.release.to_string(), "2.5.0-SNAPSHOT");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct VersionDeriver {
    base: Version,
    master_next: Option<Version>,
    master_next_snapshot: Option<Version>,
    release: Option<Version>,
    release_snapshot: bool,
}

impl VersionDeriver {
    /// Start a derivation anchored at `base`.
    pub const fn new(base: Version) -> Self {
        Self {
            base,
            master_next: None,
            master_next_snapshot: None,
            release: None,
            release_snapshot: true,
        }
    }

    /// The anchor version.
    pub const fn base(&self) -> Version {
        self.base
    }

    /// [`compute_next`] against this deriver's base.
    pub fn compute_next(&self, branch: TargetBranch, snapshot: bool) -> VersionResult<Version> {
        compute_next(self.base, branch, snapshot)
    }

    /// Override master-next, or derive it when `None`.
    pub const fn with_master_next(mut self, version: Option<Version>) -> Self {
        self.master_next = version;
        self
    }

    /// Override the master-next snapshot, or derive it when `None`.
    pub const fn with_master_next_snapshot(mut self, version: Option<Version>) -> Self {
        self.master_next_snapshot = version;
        self
    }

    /// Override the release version, or derive it when `None`.
    pub const fn with_release(mut self, version: Option<Version>) -> Self {
        self.release = version;
        self
    }

    /// Whether a derived release version carries the snapshot marker (default: yes).
    pub const fn with_release_snapshot(mut self, snapshot: bool) -> Self {
        self.release_snapshot = snapshot;
        self
    }

    /// Resolve every slot.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::Overflow`] when a slot left to derivation
    /// cannot be computed.
    #[instrument(skip(self), fields(base = %self.base))]
    pub fn finish(self) -> VersionResult<DerivedVersions> {
        let resolve = |slot: Option<Version>, branch, snapshot| match slot {
            Some(version) => Ok(version),
            None => self.compute_next(branch, snapshot),
        };
        let versions = DerivedVersions {
            base: self.base,
            master_next: resolve(self.master_next, TargetBranch::Master, false)?,
            master_next_snapshot: resolve(self.master_next_snapshot, TargetBranch::Master, true)?,
            release: resolve(self.release, TargetBranch::Release, self.release_snapshot)?,
        };
        debug!(
            master_next = %versions.master_next,
            master_next_snapshot = %versions.master_next_snapshot,
            release = %versions.release,
            "versions derived"
        );
        Ok(versions)
    }
}
