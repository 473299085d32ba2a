//! Operator interaction: prompts in, status messages out.
//!
//! The release workflow talks to the operator only through these two traits,
//! so it never depends on a terminal library. The CLI provides terminal
//! implementations; tests use scripted ones.

use std::fmt;

use thiserror::Error;

/// Errors from an interactive prompt.
#[derive(Error, Debug)]
pub enum PromptError {
    /// The operator cancelled or interrupted the prompt.
    #[error("prompt cancelled")]
    Cancelled,

    /// The prompt could not be shown (no TTY, broken pipe, ...).
    #[error("prompt failed: {0}")]
    Io(String),
}

/// Result alias for prompt operations.
pub type PromptResult<T> = Result<T, PromptError>;

/// Asks the operator questions.
pub trait Prompter {
    /// Yes/no question with a default answer.
    fn confirm(&self, message: &str, default: bool) -> PromptResult<bool>;

    /// Free-text question with a default answer.
    fn input(&self, message: &str, default: &str) -> PromptResult<String>;
}

/// Receives status messages for the operator.
pub trait Reporter {
    /// A long-running action has started.
    fn progress(&self, message: &str);

    /// The current action finished successfully.
    fn success(&self, message: &str);

    /// Informational message.
    fn info(&self, message: &str);

    /// Something went wrong but the run continues, or the run stopped on purpose.
    fn warn(&self, message: &str);

    /// A failure, with the underlying diagnostic.
    fn error(&self, message: &str, detail: &dyn fmt::Display);
}

impl<P: Prompter + ?Sized> Prompter for &P {
    fn confirm(&self, message: &str, default: bool) -> PromptResult<bool> {
        (**self).confirm(message, default)
    }

    fn input(&self, message: &str, default: &str) -> PromptResult<String> {
        (**self).input(message, default)
    }
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn progress(&self, message: &str) {
        (**self).progress(message);
    }

    fn success(&self, message: &str) {
        (**self).success(message);
    }

    fn info(&self, message: &str) {
        (**self).info(message);
    }

    fn warn(&self, message: &str) {
        (**self).warn(message);
    }

    fn error(&self, message: &str, detail: &dyn fmt::Display) {
        (**self).error(message, detail);
    }
}
