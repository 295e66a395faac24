//! Capability interface for everything that needs a human.
//!
//! The processing core never talks to a terminal directly. Dialogs,
//! progress and notifications go through [`UserInteraction`], so the
//! binary can plug in terminal prompts and tests can plug in a script.

use crate::error::Result;
use std::path::Path;

/// Answer to an "output already exists" question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteChoice {
    /// Overwrite this file only
    Yes,
    /// Skip this file only
    No,
    /// Overwrite this and every later file without asking
    Always,
    /// Skip this and every later existing file without asking
    Never,
}

impl OverwriteChoice {
    /// All choices in the order they are offered.
    pub const ALL: [Self; 4] = [Self::Yes, Self::No, Self::Always, Self::Never];

    /// Label shown to the user.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
            Self::Always => "Always",
            Self::Never => "Never",
        }
    }
}

/// Which system prompt the user picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptChoice {
    /// Index into the prompt library
    Library(usize),
    /// The user wants to type a new prompt
    Custom,
}

/// Dialogs and notifications the core depends on.
///
/// Methods returning `Option` use `None` for a dismissed dialog.
pub trait UserInteraction {
    /// Asks whether an existing output file may be replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the dialog cannot be shown.
    fn confirm_overwrite(&mut self, path: &Path) -> Result<Option<OverwriteChoice>>;

    /// Lets the user pick one of `prompts` or ask for a custom one.
    ///
    /// # Errors
    ///
    /// Returns an error if the dialog cannot be shown.
    fn pick_prompt(&mut self, prompts: &[String]) -> Result<Option<PromptChoice>>;

    /// Asks for a line of free text.
    ///
    /// # Errors
    ///
    /// Returns an error if the dialog cannot be shown.
    fn input_text(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Progress update for a long-running walk.
    fn report_progress(&mut self, message: &str);

    /// Non-blocking error notification.
    fn report_error(&mut self, message: &str);

    /// Non-blocking informational notification.
    fn report_info(&mut self, message: &str);
}
