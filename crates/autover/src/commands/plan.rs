//! Plan command: show derived versions and branch names without side effects.

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use autover_core::branch::ReleaseBranches;
use autover_core::config::Config;
use autover_core::lifecycle::ReleaseSettings;
use autover_core::manifest::{PackageJson, VersionStore};
use autover_core::version::{DerivedVersions, derive_all, parse_version};

/// Arguments for the `plan` subcommand.
#[derive(Args, Debug, Default)]
pub struct PlanArgs {
    /// Base version (default: read from the manifest)
    #[arg(long, value_name = "VERSION")]
    pub base: Option<String>,

    /// Manifest holding the current version (overrides config)
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<Utf8PathBuf>,
}

#[derive(Serialize)]
struct Plan {
    versions: DerivedVersions,
    tag: String,
    remote: String,
    release_branch: String,
    branches: ReleaseBranches,
}

/// Print the plan for a run from the given (or current) base version.
#[instrument(name = "cmd_plan", skip_all, fields(json_output))]
pub fn cmd_plan(
    args: PlanArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing plan command");

    let base = match super::parse_base(args.base.as_deref())? {
        Some(base) => base,
        None => {
            let path = cwd.join(super::resolve_manifest(args.manifest.as_deref(), config));
            let raw = PackageJson::new(&path)
                .read_version()
                .context("failed to read the current version")?;
            parse_version(&raw).with_context(|| format!("{path} holds an invalid version"))?
        }
    };

    let settings = ReleaseSettings::from_config(config);
    let versions = derive_all(base).context("cannot derive the next versions")?;
    let plan = Plan {
        versions,
        tag: versions.master_next.tag(),
        branches: settings.naming.for_run(&versions),
        remote: settings.remote,
        release_branch: settings.release_branch,
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!(
        "{}: {}",
        "Base".bold(),
        plan.versions.base.to_string().dimmed()
    );
    println!();
    println!("{}", "Versions".bold().underline());
    println!(
        "  {:<18} {}",
        "master",
        plan.versions.master_next.to_string().green().bold()
    );
    println!(
        "  {:<18} {}",
        "master snapshot",
        plan.versions.master_next_snapshot.to_string().green()
    );
    println!(
        "  {:<18} {}",
        plan.release_branch,
        plan.versions.release.to_string().green()
    );
    println!();
    println!("{}", "Git".bold().underline());
    println!("  {:<18} {}", "tag", plan.tag.cyan());
    println!("  {:<18} {}", "hotfix branch", plan.branches.hotfix.cyan());
    println!("  {:<18} {}", "dev branch", plan.branches.dev.cyan());
    println!(
        "  {:<18} {} {}",
        "may delete",
        plan.branches.previous_hotfix.yellow(),
        plan.branches.previous_dev.yellow()
    );
    println!("  {:<18} {}", "remote", plan.remote);

    Ok(())
}
