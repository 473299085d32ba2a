//! Git command execution.
//!
//! [`GitRunner`] is the single seam between the release workflow and the
//! version-control system: implementors only provide [`GitRunner::run`], and
//! the provided methods spell out the exact argv of every operation the
//! workflow performs.
//!
//! [`SystemGit`] shells out to `git`, so the user's SSH keys, signing setup,
//! and hooks apply. [`DryRunGit`] records commands without running them.

use std::cell::RefCell;
use std::path::PathBuf;
use std::process::Command;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// Failed to execute the `git` command.
    #[error("failed to run git: {0}")]
    Exec(#[from] std::io::Error),

    /// `git` returned a non-zero exit code.
    #[error("`git {command}` failed: {stderr}")]
    Command {
        /// The command line that failed, without the leading `git`.
        command: String,
        /// Captured stderr.
        stderr: String,
    },

    /// Not inside a git repository.
    #[error("not a git repository (or any parent up to mount point)")]
    NotARepo,
}

/// Result alias for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// Render argv as a single shell-like line for logs and messages.
pub fn command_line(args: &[&str]) -> String {
    args.iter()
        .map(|arg| {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                format!("\"{arg}\"")
            } else {
                (*arg).to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Locate the `git` executable on `PATH`.
pub fn git_binary() -> Option<PathBuf> {
    which::which("git").ok()
}

// ──────────────────────────────────────────────
// Runner trait
// ──────────────────────────────────────────────

/// Executes git commands. Each call is attempted exactly once.
pub trait GitRunner {
    /// Run `git <args>` and return its stdout.
    fn run(&self, args: &[&str]) -> GitResult<String>;

    /// `git add <path>`
    fn add(&self, path: &str) -> GitResult<()> {
        self.run(&["add", path]).map(drop)
    }

    /// `git commit -m <message>`
    fn commit(&self, message: &str) -> GitResult<()> {
        self.run(&["commit", "-m", message]).map(drop)
    }

    /// `git push`
    fn push(&self) -> GitResult<()> {
        self.run(&["push"]).map(drop)
    }

    /// `git push --set-upstream <remote> <branch>`
    fn push_set_upstream(&self, remote: &str, branch: &str) -> GitResult<()> {
        self.run(&["push", "--set-upstream", remote, branch]).map(drop)
    }

    /// `git tag -a <tag> -m <message>`
    fn tag_annotated(&self, tag: &str, message: &str) -> GitResult<()> {
        self.run(&["tag", "-a", tag, "-m", message]).map(drop)
    }

    /// `git push <remote> <tag>`
    fn push_tag(&self, remote: &str, tag: &str) -> GitResult<()> {
        self.run(&["push", remote, tag]).map(drop)
    }

    /// `git checkout <branch>`
    fn checkout(&self, branch: &str) -> GitResult<()> {
        self.run(&["checkout", branch]).map(drop)
    }

    /// `git checkout -b <branch>`
    fn checkout_new_branch(&self, branch: &str) -> GitResult<()> {
        self.run(&["checkout", "-b", branch]).map(drop)
    }

    /// `git branch -d <branch>`
    fn delete_local_branch(&self, branch: &str) -> GitResult<()> {
        self.run(&["branch", "-d", branch]).map(drop)
    }

    /// `git push <remote> :<branch>`
    fn delete_remote_branch(&self, remote: &str, branch: &str) -> GitResult<()> {
        let refspec = format!(":{branch}");
        self.run(&["push", remote, &refspec]).map(drop)
    }
}

impl<G: GitRunner + ?Sized> GitRunner for &G {
    fn run(&self, args: &[&str]) -> GitResult<String> {
        (**self).run(args)
    }
}

// ──────────────────────────────────────────────
// System git
// ──────────────────────────────────────────────

/// Runs the real `git` binary.
#[derive(Debug, Clone, Default)]
pub struct SystemGit {
    dir: Option<Utf8PathBuf>,
}

impl SystemGit {
    /// Run in the process working directory.
    pub const fn new() -> Self {
        Self { dir: None }
    }

    /// Run in `dir`.
    pub fn in_dir<P: AsRef<Utf8Path>>(dir: P) -> Self {
        Self {
            dir: Some(dir.as_ref().to_path_buf()),
        }
    }

    /// Check if the working directory is inside a git repository.
    #[instrument(skip(self))]
    pub fn is_inside_repo(&self) -> GitResult<bool> {
        match self.run(&["rev-parse", "--is-inside-work-tree"]) {
            Ok(output) => Ok(output.trim() == "true"),
            Err(GitError::Command { .. } | GitError::NotARepo) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Get the current branch name, or `None` on a detached HEAD.
    #[instrument(skip(self))]
    pub fn current_branch(&self) -> GitResult<Option<String>> {
        let output = self.run(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        let branch = output.trim().to_string();
        if branch == "HEAD" {
            debug!("detached HEAD");
            Ok(None)
        } else {
            debug!(%branch, "current branch");
            Ok(Some(branch))
        }
    }
}

impl GitRunner for SystemGit {
    fn run(&self, args: &[&str]) -> GitResult<String> {
        let line = command_line(args);
        debug!(command = %line, "running git");

        let mut command = Command::new("git");
        if let Some(ref dir) = self.dir {
            command.current_dir(dir);
        }
        let output = command.args(args).output()?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            debug!(command = %line, %stderr, "git failed");

            if stderr.contains("not a git repository") {
                return Err(GitError::NotARepo);
            }

            Err(GitError::Command {
                command: line,
                stderr,
            })
        }
    }
}

// ──────────────────────────────────────────────
// Dry run
// ──────────────────────────────────────────────

/// Records commands instead of running them. Every command succeeds.
#[derive(Debug, Default)]
pub struct DryRunGit {
    recorded: RefCell<Vec<String>>,
}

impl DryRunGit {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded so far, in order, without the leading `git`.
    pub fn recorded(&self) -> Vec<String> {
        self.recorded.borrow().clone()
    }
}

impl GitRunner for DryRunGit {
    fn run(&self, args: &[&str]) -> GitResult<String> {
        let line = command_line(args);
        debug!(command = %line, "dry run: would run git");
        self.recorded.borrow_mut().push(line);
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn has_git() -> bool {
        git_binary().is_some()
    }

    #[test]
    fn command_line_quotes_whitespace() {
        assert_eq!(
            command_line(&["commit", "-m", "bump to 1.2.0"]),
            r#"commit -m "bump to 1.2.0""#
        );
        assert_eq!(command_line(&["push", "origin", ":dev/1.2.x"]), "push origin :dev/1.2.x");
        assert_eq!(command_line(&["tag", "-m", ""]), r#"tag -m """#);
    }

    #[test]
    fn provided_methods_issue_expected_argv() {
        let git = DryRunGit::new();
        git.add("package.json").unwrap();
        git.commit("release 2.4.0").unwrap();
        git.push().unwrap();
        git.tag_annotated("v2.4.0", "1700000000000").unwrap();
        git.push_tag("origin", "v2.4.0").unwrap();
        git.checkout_new_branch("hotfix/2.4.x").unwrap();
        git.push_set_upstream("origin", "hotfix/2.4.x").unwrap();
        git.checkout("release").unwrap();
        git.delete_local_branch("hotfix/2.3.x").unwrap();
        git.delete_remote_branch("origin", "hotfix/2.3.x").unwrap();

        assert_eq!(
            git.recorded(),
            vec![
                "add package.json",
                r#"commit -m "release 2.4.0""#,
                "push",
                "tag -a v2.4.0 -m 1700000000000",
                "push origin v2.4.0",
                "checkout -b hotfix/2.4.x",
                "push --set-upstream origin hotfix/2.4.x",
                "checkout release",
                "branch -d hotfix/2.3.x",
                "push origin :hotfix/2.3.x",
            ]
        );
    }

    #[test]
    fn runner_by_reference() {
        let git = DryRunGit::new();
        let by_ref = &git;
        by_ref.push().unwrap();
        assert_eq!(git.recorded(), vec!["push"]);
    }

    #[test]
    fn git_error_on_bad_command() {
        if !has_git() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let result = SystemGit::in_dir(&dir).run(&["not-a-real-subcommand"]);
        assert!(result.is_err());
    }

    #[test]
    fn outside_repo_is_detected() {
        if !has_git() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let git = SystemGit::in_dir(&dir);
        assert!(!git.is_inside_repo().unwrap());
    }

    #[test]
    fn system_git_round_trip() {
        if !has_git() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let git = SystemGit::in_dir(&dir);

        git.run(&["init", "--quiet"]).unwrap();
        git.run(&["config", "user.name", "Release Bot"]).unwrap();
        git.run(&["config", "user.email", "release@example.com"]).unwrap();
        git.run(&["config", "commit.gpgsign", "false"]).unwrap();
        git.run(&["config", "tag.gpgsign", "false"]).unwrap();
        assert!(git.is_inside_repo().unwrap());

        std::fs::write(dir.join("package.json"), "{\"version\": \"1.0.0\"}\n").unwrap();
        git.checkout_new_branch("trunk").unwrap();
        git.add("package.json").unwrap();
        git.commit("initial").unwrap();
        git.tag_annotated("v1.0.0", "1700000000000").unwrap();
        assert_eq!(git.run(&["tag", "--list"]).unwrap().trim(), "v1.0.0");

        git.checkout_new_branch("hotfix/1.0.x").unwrap();
        assert_eq!(git.current_branch().unwrap().as_deref(), Some("hotfix/1.0.x"));

        git.checkout("trunk").unwrap();
        git.delete_local_branch("hotfix/1.0.x").unwrap();
        let err = git.delete_local_branch("hotfix/1.0.x").unwrap_err();
        assert!(matches!(
            err,
            GitError::Command { ref command, .. } if command == "branch -d hotfix/1.0.x"
        ));
    }
}
