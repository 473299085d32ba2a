//! Run command: thin CLI layer over `autover_core::lifecycle`.

use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, info, instrument};

use autover_core::config::Config;
use autover_core::git::{DryRunGit, GitRunner, SystemGit, git_binary};
use autover_core::lifecycle::{
    AbortReason, LifecycleOutcome, ReleaseLifecycle, ReleaseSettings, State,
};
use autover_core::manifest::{DryRunStore, PackageJson, VersionStore};

use crate::terminal::{InquirePrompter, TerminalReporter};

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Pre-fill the current master version (e.g., "2.3.5" or "v2.3.5")
    #[arg(long, value_name = "VERSION")]
    pub base: Option<String>,

    /// Manifest holding the version (overrides config)
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<Utf8PathBuf>,

    /// Print the git commands and manifest writes instead of performing them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Serialize)]
struct RunReport<'a> {
    dry_run: bool,
    manifest: &'a Utf8Path,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    commands: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    manifest_writes: Vec<String>,
    #[serde(flatten)]
    outcome: &'a LifecycleOutcome,
}

/// Execute the release workflow.
#[instrument(name = "cmd_run", skip_all, fields(dry_run = args.dry_run))]
pub fn cmd_run(
    args: RunArgs,
    global_json: bool,
    quiet: bool,
    config: &Config,
    cwd: &Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing run command");

    let settings = ReleaseSettings::from_config(config)
        .with_base_version(super::parse_base(args.base.as_deref())?);
    let manifest = cwd.join(super::resolve_manifest(args.manifest.as_deref(), config));
    let reporter = TerminalReporter::new(quiet, args.dry_run);

    let (outcome, commands, manifest_writes) = if args.dry_run {
        if !global_json {
            println!(
                "\n{}\n",
                "DRY RUN: no commands run, no files written".yellow().bold()
            );
        }
        let git = DryRunGit::new();
        let store = DryRunStore::new(PackageJson::new(&manifest));
        let outcome = execute(&git, &store, &reporter, settings);
        let writes = store
            .discarded()
            .iter()
            .map(ToString::to_string)
            .collect();
        (outcome, git.recorded(), writes)
    } else {
        if git_binary().is_none() {
            bail!("git not found on PATH");
        }
        let git = SystemGit::in_dir(cwd);
        if !git
            .is_inside_repo()
            .context("failed to inspect the working directory")?
        {
            bail!("{cwd} is not inside a git repository");
        }
        let outcome = execute(&git, PackageJson::new(&manifest), &reporter, settings);
        (outcome, Vec::new(), Vec::new())
    };
    drop(reporter);

    if global_json {
        let report = RunReport {
            dry_run: args.dry_run,
            manifest: &manifest,
            commands,
            manifest_writes,
            outcome: &outcome,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&outcome, &commands, &manifest_writes, &manifest);
    }

    match outcome.state {
        State::Aborted {
            reason: AbortReason::UserDeclined,
            ..
        } => {
            info!("run declined by operator");
            Ok(())
        }
        State::Aborted { at, reason } => bail!("release workflow aborted at {at}: {reason}"),
        State::Done | State::At(_) => Ok(()),
    }
}

fn execute<G: GitRunner, S: VersionStore>(
    git: G,
    store: S,
    reporter: &TerminalReporter,
    settings: ReleaseSettings,
) -> LifecycleOutcome {
    ReleaseLifecycle::new(git, store, InquirePrompter, reporter, settings).run()
}

fn print_summary(
    outcome: &LifecycleOutcome,
    commands: &[String],
    manifest_writes: &[String],
    manifest: &Utf8Path,
) {
    if !commands.is_empty() {
        println!();
        println!("{}", "Would run".bold().underline());
        for command in commands {
            println!("  git {}", command.cyan());
        }
    }
    if !manifest_writes.is_empty() {
        println!();
        println!("{} {}", "Would write".bold().underline(), manifest.dimmed());
        for version in manifest_writes {
            println!("  {}", version.green());
        }
    }

    let Some(ref versions) = outcome.versions else {
        return;
    };
    println!();
    match outcome.state {
        State::Done => println!(
            "{} {} → {}",
            "Released".green().bold(),
            versions.base.to_string().dimmed(),
            versions.master_next.to_string().green().bold()
        ),
        State::Aborted { at, reason } => println!(
            "{} at {}: {}",
            "Stopped".red().bold(),
            at.to_string().bold(),
            reason
        ),
        State::At(_) => {}
    }
    if let Some(ref branches) = outcome.branches {
        println!("  {:<16} {}", "tag", versions.master_next.tag().cyan());
        println!("  {:<16} {}", "hotfix branch", branches.hotfix.cyan());
        println!("  {:<16} {}", "dev branch", branches.dev.cyan());
    }
}
