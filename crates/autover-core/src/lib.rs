//! Core library for autover.
//!
//! autover drives a fixed master/release git workflow: tag the next minor
//! on master, leave a snapshot behind, cut a hotfix branch, advance the
//! release branch, and open the next dev branch.
//!
//! # Modules
//!
//! - [`version`] - Version model and next-version derivation
//! - [`branch`] - Hotfix and dev branch naming
//! - [`manifest`] - Reading and writing the version in `package.json`
//! - [`git`] - Git command execution
//! - [`interact`] - Prompt and status-report seams
//! - [`lifecycle`] - The release workflow state machine
//! - [`config`] - Configuration loading and management
//! - [`error`] - Configuration error types
//!
//! # Quick Start
//!
//! ```
//! use autover_core::version::{derive_all, parse_version};
//! use autover_core::branch::BranchNaming;
//!
//! let versions = derive_all(parse_version("2.3.5").unwrap()).unwrap();
//! let branches = BranchNaming::default().for_run(&versions);
//!
//! assert_eq!(versions.master_next_snapshot.to_string(), "2.4.1-SNAPSHOT");
//! assert_eq!(branches.hotfix, "hotfix/2.4.x");
//! assert_eq!(branches.dev, "dev/2.5.x");
//! ```
#![deny(unsafe_code)]

pub mod branch;

pub mod config;

pub mod error;

pub mod git;

pub mod interact;

pub mod lifecycle;

pub mod manifest;

pub mod version;

pub use config::{Config, ConfigLoader, LogLevel};

pub use error::{ConfigError, ConfigResult};

pub use lifecycle::{LifecycleOutcome, ReleaseLifecycle, ReleaseSettings};

pub use version::{DerivedVersions, Version};
