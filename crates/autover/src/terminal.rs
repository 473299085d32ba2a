//! Terminal implementations of the prompt and report seams.
//!
//! Everything here writes to stderr, so `--json` output on stdout stays
//! machine-readable while the workflow is still interactive.

use std::cell::RefCell;
use std::fmt;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Confirm, InquireError, Text};
use owo_colors::{OwoColorize, Stream};

use autover_core::interact::{PromptError, PromptResult, Prompter, Reporter};

const INFO_RGB: (u8, u8, u8) = (0x12, 0xa8, 0xcd);
const WARN_RGB: (u8, u8, u8) = (0xe5, 0xe5, 0x11);
const ERROR_RGB: (u8, u8, u8) = (0xf8, 0x7f, 0x70);

const SPINNER_TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

fn paint(text: &str, (r, g, b): (u8, u8, u8)) -> String {
    text.if_supports_color(Stream::Stderr, |t| t.truecolor(r, g, b))
        .to_string()
}

// ──────────────────────────────────────────────
// Prompts
// ──────────────────────────────────────────────

/// Prompts through inquire.
#[derive(Debug, Clone, Copy, Default)]
pub struct InquirePrompter;

fn prompt_error(err: InquireError) -> PromptError {
    match err {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => {
            PromptError::Cancelled
        }
        other => PromptError::Io(other.to_string()),
    }
}

impl Prompter for InquirePrompter {
    fn confirm(&self, message: &str, default: bool) -> PromptResult<bool> {
        Confirm::new(message)
            .with_default(default)
            .prompt()
            .map_err(prompt_error)
    }

    fn input(&self, message: &str, default: &str) -> PromptResult<String> {
        Text::new(message)
            .with_default(default)
            .prompt()
            .map_err(prompt_error)
    }
}

// ──────────────────────────────────────────────
// Status output
// ──────────────────────────────────────────────

/// Spinner and colored status lines on stderr.
#[derive(Default)]
pub struct TerminalReporter {
    spinner: RefCell<Option<ProgressBar>>,
    quiet: bool,
    dry_run: bool,
}

impl TerminalReporter {
    /// Create a reporter. `quiet` keeps only warnings and errors.
    pub fn new(quiet: bool, dry_run: bool) -> Self {
        Self {
            spinner: RefCell::new(None),
            quiet,
            dry_run,
        }
    }

    fn clear_spinner(&self) {
        if let Some(spinner) = self.spinner.borrow_mut().take() {
            spinner.finish_and_clear();
        }
    }
}

impl Drop for TerminalReporter {
    fn drop(&mut self) {
        self.clear_spinner();
    }
}

impl Reporter for TerminalReporter {
    fn progress(&self, message: &str) {
        self.clear_spinner();
        if self.quiet {
            return;
        }
        let style = ProgressStyle::with_template("  {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(SPINNER_TICKS);
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.set_message(format!("{message}..."));
        spinner.enable_steady_tick(Duration::from_millis(80));
        *self.spinner.borrow_mut() = Some(spinner);
    }

    fn success(&self, message: &str) {
        self.clear_spinner();
        if self.quiet {
            return;
        }
        let mark = if self.dry_run { "○" } else { "✓" };
        eprintln!(
            "  {} {message}",
            mark.if_supports_color(Stream::Stderr, |t| t.green())
        );
    }

    fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.clear_spinner();
        eprintln!("  {} {}", paint("ℹ", INFO_RGB), paint(message, INFO_RGB));
    }

    fn warn(&self, message: &str) {
        self.clear_spinner();
        eprintln!("  {} {}", paint("!", WARN_RGB), paint(message, WARN_RGB));
    }

    fn error(&self, message: &str, detail: &dyn fmt::Display) {
        self.clear_spinner();
        eprintln!("  {} {}", paint("✗", ERROR_RGB), paint(message, ERROR_RGB));
        let detail = detail.to_string();
        for line in detail.lines() {
            eprintln!(
                "    {}",
                line.if_supports_color(Stream::Stderr, |t| t.dimmed())
            );
        }
    }
}
