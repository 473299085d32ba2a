//! Configuration errors.
//!
//! Other modules define their own error enums next to the code that raises
//! them ([`crate::version::VersionError`], [`crate::git::GitError`],
//! [`crate::manifest::ManifestError`], [`crate::lifecycle::LifecycleError`]).

use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A config file was unreadable or held an invalid value.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// No config file was found in any searched location.
    #[error("no configuration file found")]
    NotFound,
}

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
