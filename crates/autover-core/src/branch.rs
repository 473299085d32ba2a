//! Branch naming for the hotfix and dev lines.
//!
//! A line branch is named after a version with its patch generalized:
//! `2.4.0` → `hotfix/2.4.x`. The snapshot marker never appears in a name.

use std::fmt;

use serde::Serialize;

use crate::version::{DerivedVersions, Version};

/// Default prefix for hotfix branches.
pub const DEFAULT_HOTFIX_PREFIX: &str = "hotfix/";

/// Default prefix for development branches.
pub const DEFAULT_DEV_PREFIX: &str = "dev/";

/// The role a line branch plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchRole {
    /// Maintenance branch cut from a just-released version.
    Hotfix,
    /// Branch for the next development cycle.
    Dev,
}

impl fmt::Display for BranchRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hotfix => write!(f, "hotfix"),
            Self::Dev => write!(f, "dev"),
        }
    }
}

/// Build `{prefix}{major}.{minor}.x` from a version.
pub fn branch_name(prefix: &str, version: &Version) -> String {
    format!("{prefix}{}.{}.x", version.major, version.minor)
}

/// Configured prefix per branch role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchNaming {
    /// Prefix for hotfix branches.
    pub hotfix_prefix: String,
    /// Prefix for dev branches.
    pub dev_prefix: String,
}

impl Default for BranchNaming {
    fn default() -> Self {
        Self {
            hotfix_prefix: DEFAULT_HOTFIX_PREFIX.to_string(),
            dev_prefix: DEFAULT_DEV_PREFIX.to_string(),
        }
    }
}

impl BranchNaming {
    /// The prefix configured for `role`.
    pub fn prefix(&self, role: BranchRole) -> &str {
        match role {
            BranchRole::Hotfix => &self.hotfix_prefix,
            BranchRole::Dev => &self.dev_prefix,
        }
    }

    /// Name the `role` branch for `version`.
    pub fn name(&self, role: BranchRole, version: &Version) -> String {
        branch_name(self.prefix(role), version)
    }

    /// Every line branch a run creates or deletes.
    pub fn for_run(&self, versions: &DerivedVersions) -> ReleaseBranches {
        ReleaseBranches {
            hotfix: self.name(BranchRole::Hotfix, &versions.master_next),
            previous_hotfix: self.name(BranchRole::Hotfix, &versions.base),
            dev: self.name(BranchRole::Dev, &versions.release),
            previous_dev: self.name(BranchRole::Dev, &versions.master_next),
        }
    }
}

/// Branch names touched by one run.
///
/// The `previous_*` names are reconstructed from the derived versions, not
/// read from the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseBranches {
    /// New hotfix branch (from master-next).
    pub hotfix: String,
    /// Stale hotfix branch (from base).
    pub previous_hotfix: String,
    /// New dev branch (from release).
    pub dev: String,
    /// Stale dev branch (from master-next).
    pub previous_dev: String,
}
