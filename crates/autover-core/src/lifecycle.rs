//! The release workflow as a linear state machine.
//!
//! ```text
//! Confirm → TagRelease → Snapshot → Hotfix → ReleaseBump → DevBranch → Done
//!    └──────────┴───────────┴─────────┴──────────┴────────────┴──→ Aborted
//! ```
//!
//! Each step either continues or aborts the run. There is no retry and no
//! rollback: side effects of completed steps stay in place.
//!
//! Primary actions (manifest writes, commits, pushes, tags, branch
//! creation) abort the run on failure. Deleting a stale line branch is a
//! cleanup action: its failures are reported and logged, never fatal.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, info_span, instrument, warn};

use crate::branch::{BranchNaming, BranchRole, ReleaseBranches};
use crate::config::Config;
use crate::git::{GitError, GitRunner};
use crate::interact::{PromptError, Prompter, Reporter};
use crate::manifest::{ManifestError, VersionStore};
use crate::version::{DerivedVersions, Version, VersionError, derive_all, parse_version};

/// Default remote.
pub const DEFAULT_REMOTE: &str = "origin";

/// Default release branch.
pub const DEFAULT_RELEASE_BRANCH: &str = "release";

/// Default commit message template.
pub const DEFAULT_COMMIT_MESSAGE: &str = "chore(version): bump version to {version}";

/// Errors that stop a step.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// A git command failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// Reading or writing the manifest failed.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// A prompt could not be answered.
    #[error(transparent)]
    Prompt(#[from] PromptError),

    /// The operator entered an invalid base version.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// A step needing derived versions ran before Confirm completed.
    #[error("versions have not been derived; the confirm step has not completed")]
    NotConfirmed,
}

impl LifecycleError {
    /// Classify the error for the step outcome.
    pub const fn abort_reason(&self) -> AbortReason {
        match self {
            Self::Git(_) => AbortReason::CommandFailed,
            Self::Manifest(_) => AbortReason::ManifestFailed,
            Self::Prompt(_) => AbortReason::PromptFailed,
            Self::Version(_) => AbortReason::InvalidVersion,
            Self::NotConfirmed => AbortReason::NotConfirmed,
        }
    }
}

/// Result alias for lifecycle steps.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

// ──────────────────────────────────────────────
// States and transitions
// ──────────────────────────────────────────────

/// One step of the release workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Confirm the release → master merge and derive versions.
    Confirm,
    /// Commit master-next, push, tag `v<master-next>`, push the tag.
    TagRelease,
    /// Write the master-next snapshot to the manifest.
    Snapshot,
    /// Cut and push the hotfix branch; optionally delete the previous one.
    Hotfix,
    /// Bump the release branch.
    ReleaseBump,
    /// Cut and push the dev branch; optionally delete the previous one.
    DevBranch,
}

impl Step {
    /// Every step, in execution order.
    pub const ALL: [Self; 6] = [
        Self::Confirm,
        Self::TagRelease,
        Self::Snapshot,
        Self::Hotfix,
        Self::ReleaseBump,
        Self::DevBranch,
    ];

    /// The step after this one, or `None` after the last.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Confirm => Some(Self::TagRelease),
            Self::TagRelease => Some(Self::Snapshot),
            Self::Snapshot => Some(Self::Hotfix),
            Self::Hotfix => Some(Self::ReleaseBump),
            Self::ReleaseBump => Some(Self::DevBranch),
            Self::DevBranch => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Confirm => write!(f, "confirm"),
            Self::TagRelease => write!(f, "tag release"),
            Self::Snapshot => write!(f, "snapshot"),
            Self::Hotfix => write!(f, "hotfix branch"),
            Self::ReleaseBump => write!(f, "release bump"),
            Self::DevBranch => write!(f, "dev branch"),
        }
    }
}

/// Why a run stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// The operator said the merge has not happened yet.
    UserDeclined,
    /// A primary git command failed.
    CommandFailed,
    /// The manifest could not be read or written.
    ManifestFailed,
    /// A prompt was cancelled or could not be shown.
    PromptFailed,
    /// The entered base version did not parse.
    InvalidVersion,
    /// Versions were needed before they were derived.
    NotConfirmed,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserDeclined => write!(f, "declined by operator"),
            Self::CommandFailed => write!(f, "git command failed"),
            Self::ManifestFailed => write!(f, "manifest update failed"),
            Self::PromptFailed => write!(f, "prompt failed"),
            Self::InvalidVersion => write!(f, "invalid version"),
            Self::NotConfirmed => write!(f, "versions not derived"),
        }
    }
}

/// What a step tells the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepSignal {
    /// Proceed to the next step.
    Continue,
    /// Stop the run.
    Abort(AbortReason),
}

/// Position of a run in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    /// About to run this step.
    At(Step),
    /// Every step completed.
    Done,
    /// A step stopped the run.
    Aborted {
        /// The step that stopped.
        at: Step,
        /// Why it stopped.
        reason: AbortReason,
    },
}

impl State {
    /// The initial state.
    pub const START: Self = Self::At(Step::Confirm);

    /// Apply a step's signal. Terminal states absorb every signal.
    pub const fn advance(self, signal: StepSignal) -> Self {
        match (self, signal) {
            (Self::At(step), StepSignal::Continue) => match step.next() {
                Some(next) => Self::At(next),
                None => Self::Done,
            },
            (Self::At(at), StepSignal::Abort(reason)) => Self::Aborted { at, reason },
            (terminal, _) => terminal,
        }
    }

    /// Whether the run has finished, successfully or not.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::At(_))
    }
}

// ──────────────────────────────────────────────
// Outcomes
// ──────────────────────────────────────────────

/// Result of a stale-branch cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupOutcome {
    /// The branch offered for deletion.
    pub branch: String,
    /// Whether the operator agreed to delete it.
    pub requested: bool,
    /// Whether `git branch -d` succeeded.
    pub local_deleted: bool,
    /// Whether the remote deletion push succeeded.
    pub remote_deleted: bool,
}

/// Record of one executed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    /// The step.
    pub step: Step,
    /// Continue or abort.
    pub signal: StepSignal,
    /// Human-readable summary.
    pub message: String,
    /// Stale-branch cleanup, for the branch-creating steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup: Option<CleanupOutcome>,
}

impl StepOutcome {
    fn proceed(step: Step, message: impl Into<String>) -> Self {
        Self {
            step,
            signal: StepSignal::Continue,
            message: message.into(),
            cleanup: None,
        }
    }

    fn stop(step: Step, reason: AbortReason, message: impl Into<String>) -> Self {
        Self {
            step,
            signal: StepSignal::Abort(reason),
            message: message.into(),
            cleanup: None,
        }
    }

    fn with_cleanup(mut self, cleanup: CleanupOutcome) -> Self {
        self.cleanup = Some(cleanup);
        self
    }
}

/// Result of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleOutcome {
    /// Final state, always terminal.
    pub state: State,
    /// Executed steps, in order.
    pub steps: Vec<StepOutcome>,
    /// Derived versions, once Confirm has completed.
    pub versions: Option<DerivedVersions>,
    /// Line branches of this run, once versions are known.
    pub branches: Option<ReleaseBranches>,
}

impl LifecycleOutcome {
    /// Whether every step completed.
    pub const fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// The abort reason, if the run stopped early.
    pub const fn abort_reason(&self) -> Option<AbortReason> {
        match self.state {
            State::Aborted { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

// ──────────────────────────────────────────────
// Settings
// ──────────────────────────────────────────────

/// Conventions the workflow follows, resolved from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseSettings {
    /// Remote to push to.
    pub remote: String,
    /// The long-lived release branch.
    pub release_branch: String,
    /// Hotfix and dev prefixes.
    pub naming: BranchNaming,
    /// Commit message template; `{version}` is substituted.
    pub commit_message: String,
    /// Default answer for deleting the previous hotfix branch.
    pub delete_previous_hotfix: bool,
    /// Default answer for deleting the previous dev branch.
    pub delete_previous_dev: bool,
    /// Pre-filled answer for the base-version prompt.
    pub base_version: Option<Version>,
}

impl Default for ReleaseSettings {
    fn default() -> Self {
        Self {
            remote: DEFAULT_REMOTE.to_string(),
            release_branch: DEFAULT_RELEASE_BRANCH.to_string(),
            naming: BranchNaming::default(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            delete_previous_hotfix: true,
            delete_previous_dev: false,
            base_version: None,
        }
    }
}

impl ReleaseSettings {
    /// Resolve settings from configuration, filling unset values with defaults.
    pub fn from_config(config: &Config) -> Self {
        let mut settings = Self::default();
        if let Some(ref git) = config.git {
            if let Some(ref remote) = git.remote {
                settings.remote.clone_from(remote);
            }
            if let Some(ref branch) = git.release_branch {
                settings.release_branch.clone_from(branch);
            }
            if let Some(ref prefix) = git.hotfix_prefix {
                settings.naming.hotfix_prefix.clone_from(prefix);
            }
            if let Some(ref prefix) = git.dev_prefix {
                settings.naming.dev_prefix.clone_from(prefix);
            }
            if let Some(ref message) = git.commit_message {
                settings.commit_message.clone_from(message);
            }
        }
        if let Some(ref cleanup) = config.cleanup {
            if let Some(hotfix) = cleanup.delete_previous_hotfix {
                settings.delete_previous_hotfix = hotfix;
            }
            if let Some(dev) = cleanup.delete_previous_dev {
                settings.delete_previous_dev = dev;
            }
        }
        settings
    }

    /// Pre-fill the base-version prompt.
    pub const fn with_base_version(mut self, version: Option<Version>) -> Self {
        self.base_version = version;
        self
    }

    /// The commit message for a bump to `version`.
    pub fn commit_message_for(&self, version: &Version) -> String {
        self.commit_message.replace("{version}", &version.to_string())
    }
}

/// Milliseconds since the Unix epoch.
pub fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}

// ──────────────────────────────────────────────
// Driver
// ──────────────────────────────────────────────

/// Runs the release workflow against its collaborators.
pub struct ReleaseLifecycle<G, S, P, R> {
    git: G,
    store: S,
    prompter: P,
    reporter: R,
    settings: ReleaseSettings,
    clock: fn() -> u128,
    versions: Option<DerivedVersions>,
}

impl<G, S, P, R> ReleaseLifecycle<G, S, P, R>
where
    G: GitRunner,
    S: VersionStore,
    P: Prompter,
    R: Reporter,
{
    /// Assemble a workflow run.
    pub fn new(git: G, store: S, prompter: P, reporter: R, settings: ReleaseSettings) -> Self {
        Self {
            git,
            store,
            prompter,
            reporter,
            settings,
            clock: epoch_millis,
            versions: None,
        }
    }

    /// Replace the clock used for tag messages.
    pub fn with_clock(mut self, clock: fn() -> u128) -> Self {
        self.clock = clock;
        self
    }

    /// Derived versions, once Confirm has completed.
    pub const fn versions(&self) -> Option<&DerivedVersions> {
        self.versions.as_ref()
    }

    /// Run every step until the workflow is done or aborted.
    #[instrument(
        skip_all,
        fields(
            remote = %self.settings.remote,
            release_branch = %self.settings.release_branch,
        )
    )]
    pub fn run(&mut self) -> LifecycleOutcome {
        let mut state = State::START;
        let mut steps = Vec::with_capacity(Step::ALL.len());

        while let State::At(step) = state {
            let outcome = self.run_step(step);
            state = state.advance(outcome.signal);
            steps.push(outcome);
        }

        match state {
            State::Done => info!(steps = steps.len(), "release workflow complete"),
            State::Aborted { at, reason } => warn!(%at, %reason, "release workflow aborted"),
            State::At(_) => {}
        }

        LifecycleOutcome {
            state,
            steps,
            versions: self.versions,
            branches: self
                .versions
                .as_ref()
                .map(|versions| self.settings.naming.for_run(versions)),
        }
    }

    /// Run a single step, converting failures into an abort.
    pub fn run_step(&mut self, step: Step) -> StepOutcome {
        let span = info_span!("step", %step);
        let _entered = span.enter();

        let result = match step {
            Step::Confirm => self.confirm(),
            Step::TagRelease => self.tag_release(),
            Step::Snapshot => self.snapshot(),
            Step::Hotfix => self.hotfix(),
            Step::ReleaseBump => self.release_bump(),
            Step::DevBranch => self.dev_branch(),
        };

        result.unwrap_or_else(|err| {
            error!(%step, error = %err, "step failed");
            self.reporter.error(&format!("{step} failed"), &err);
            StepOutcome::stop(step, err.abort_reason(), err.to_string())
        })
    }

    fn derived(&self) -> LifecycleResult<DerivedVersions> {
        self.versions.ok_or(LifecycleError::NotConfirmed)
    }

    fn manifest_path(&self) -> String {
        self.store.path().to_string()
    }

    fn commit_version(&self, version: &Version) -> LifecycleResult<()> {
        self.git.add(&self.manifest_path())?;
        self.git.commit(&self.settings.commit_message_for(version))?;
        Ok(())
    }

    fn confirm(&mut self) -> LifecycleResult<StepOutcome> {
        let merged = self
            .prompter
            .confirm("Has the release branch been merged into master?", true)?;
        if !merged {
            let message = "Merge the release branch into master first, then run again.";
            self.reporter.warn(message);
            return Ok(StepOutcome::stop(
                Step::Confirm,
                AbortReason::UserDeclined,
                message,
            ));
        }

        let default = match self.settings.base_version {
            Some(version) => version.to_string(),
            None => self.store.read_version()?,
        };
        let answer = self.prompter.input("Current version on master", &default)?;
        let versions = derive_all(parse_version(&answer)?)?;
        self.versions = Some(versions);

        self.reporter.info(&format!(
            "master {}, snapshot {}, release {}",
            versions.master_next, versions.master_next_snapshot, versions.release
        ));
        info!(
            base = %versions.base,
            master_next = %versions.master_next,
            release = %versions.release,
            "versions derived"
        );
        Ok(StepOutcome::proceed(
            Step::Confirm,
            format!(
                "{} → master {} / release {}",
                versions.base, versions.master_next, versions.release
            ),
        ))
    }

    fn tag_release(&mut self) -> LifecycleResult<StepOutcome> {
        let versions = self.derived()?;
        let version = versions.master_next;

        self.reporter.progress(&format!("Bumping master to {version}"));
        self.store.write_version(&version)?;
        self.commit_version(&version)?;
        self.git.push()?;
        self.reporter.success(&format!("Master bumped to {version}"));

        let tag = version.tag();
        self.reporter.progress(&format!("Tagging {tag}"));
        self.git.tag_annotated(&tag, &(self.clock)().to_string())?;
        self.git.push_tag(&self.settings.remote, &tag)?;
        self.reporter.success(&format!("Pushed {tag} to {}", self.settings.remote));

        Ok(StepOutcome::proceed(Step::TagRelease, format!("tagged {tag}")))
    }

    fn snapshot(&mut self) -> LifecycleResult<StepOutcome> {
        let version = self.derived()?.master_next_snapshot;

        self.reporter.progress(&format!("Writing snapshot {version}"));
        self.store.write_version(&version)?;
        self.reporter.success(&format!("Master snapshot is {version}"));

        Ok(StepOutcome::proceed(
            Step::Snapshot,
            format!("snapshot {version}"),
        ))
    }

    fn hotfix(&mut self) -> LifecycleResult<StepOutcome> {
        let versions = self.derived()?;
        let branches = self.settings.naming.for_run(&versions);
        let branch = &branches.hotfix;

        self.reporter.progress(&format!("Creating {branch}"));
        self.git.checkout_new_branch(branch)?;
        self.commit_version(&versions.master_next_snapshot)?;
        self.git.push_set_upstream(&self.settings.remote, branch)?;
        self.reporter.success(&format!("Pushed {branch}"));

        let cleanup = self.cleanup(
            BranchRole::Hotfix,
            &branches.previous_hotfix,
            self.settings.delete_previous_hotfix,
        )?;
        Ok(StepOutcome::proceed(Step::Hotfix, format!("created {branch}")).with_cleanup(cleanup))
    }

    fn release_bump(&mut self) -> LifecycleResult<StepOutcome> {
        let version = self.derived()?.release;
        let branch = self.settings.release_branch.clone();

        self.reporter.progress(&format!("Bumping {branch} to {version}"));
        self.git.checkout(&branch)?;
        self.store.write_version(&version)?;
        self.commit_version(&version)?;
        self.git.push_set_upstream(&self.settings.remote, &branch)?;
        self.reporter.success(&format!("{branch} bumped to {version}"));

        Ok(StepOutcome::proceed(
            Step::ReleaseBump,
            format!("{branch} at {version}"),
        ))
    }

    fn dev_branch(&mut self) -> LifecycleResult<StepOutcome> {
        let versions = self.derived()?;
        let branches = self.settings.naming.for_run(&versions);
        let branch = &branches.dev;

        self.reporter.progress(&format!("Creating {branch}"));
        self.git.checkout_new_branch(branch)?;
        self.git.push_set_upstream(&self.settings.remote, branch)?;
        self.reporter.success(&format!("Pushed {branch}"));

        let cleanup = self.cleanup(
            BranchRole::Dev,
            &branches.previous_dev,
            self.settings.delete_previous_dev,
        )?;
        Ok(StepOutcome::proceed(Step::DevBranch, format!("created {branch}")).with_cleanup(cleanup))
    }

    /// Offer to delete a stale line branch locally and on the remote.
    ///
    /// The two deletions are independent; a failure in either is reported
    /// and logged but never returned.
    fn cleanup(
        &self,
        role: BranchRole,
        branch: &str,
        default: bool,
    ) -> LifecycleResult<CleanupOutcome> {
        let requested = self
            .prompter
            .confirm(&format!("Delete the previous {role} branch {branch}?"), default)?;

        let mut outcome = CleanupOutcome {
            branch: branch.to_string(),
            requested,
            local_deleted: false,
            remote_deleted: false,
        };
        if !requested {
            info!(%branch, "keeping previous branch");
            self.reporter.info(&format!("Keeping {branch}"));
            return Ok(outcome);
        }

        match self.git.delete_local_branch(branch) {
            Ok(()) => {
                outcome.local_deleted = true;
                self.reporter.success(&format!("Deleted local branch {branch}"));
            }
            Err(err) => {
                warn!(%branch, error = %err, "local branch deletion failed");
                self.reporter.error(&format!("Could not delete local branch {branch}"), &err);
            }
        }

        let remote = &self.settings.remote;
        match self.git.delete_remote_branch(remote, branch) {
            Ok(()) => {
                outcome.remote_deleted = true;
                self.reporter.success(&format!("Deleted {remote}/{branch}"));
            }
            Err(err) => {
                warn!(%branch, %remote, error = %err, "remote branch deletion failed");
                self.reporter.error(&format!("Could not delete {remote}/{branch}"), &err);
            }
        }

        Ok(outcome)
    }
}
