//! Command implementations

pub mod info;

pub mod plan;

pub mod run;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};

use autover_core::config::Config;
use autover_core::version::{Version, parse_version};

/// Resolve the manifest path: `--manifest` first, then config, then `package.json`.
pub fn resolve_manifest(flag: Option<&Utf8Path>, config: &Config) -> Utf8PathBuf {
    flag.map_or_else(|| config.manifest_path(), Utf8Path::to_path_buf)
}

/// Parse an optional `--base` value.
pub fn parse_base(raw: Option<&str>) -> anyhow::Result<Option<Version>> {
    raw.map(|value| parse_version(value).with_context(|| format!("invalid --base {value:?}")))
        .transpose()
}
