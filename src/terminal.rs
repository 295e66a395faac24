//! Terminal implementation of [`UserInteraction`].
//!
//! Everything goes to stderr so stdout stays free for selection replies.

use crate::error::Result;
use crate::interaction::{OverwriteChoice, PromptChoice, UserInteraction};
use dialoguer::{Input, Select, theme::ColorfulTheme};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

const CUSTOM_ITEM: &str = "Custom";

/// Dialogs via `dialoguer`, progress via an `indicatif` spinner.
pub struct TerminalUi {
    theme: ColorfulTheme,
    spinner: Option<ProgressBar>,
}

impl TerminalUi {
    /// Creates a terminal UI with no active spinner.
    #[must_use]
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
            spinner: None,
        }
    }

    /// Stops and clears the spinner, if any.
    pub fn finish(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn spinner(&mut self) -> &ProgressBar {
        self.spinner.get_or_insert_with(|| {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner
        })
    }

    /// Runs `f` with the spinner hidden so a dialog can draw.
    fn suspended<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.spinner {
            Some(spinner) => spinner.suspend(f),
            None => f(),
        }
    }
}

impl Default for TerminalUi {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TerminalUi {
    fn drop(&mut self) {
        self.finish();
    }
}

impl UserInteraction for TerminalUi {
    fn confirm_overwrite(&mut self, path: &Path) -> Result<Option<OverwriteChoice>> {
        let labels: Vec<&str> = OverwriteChoice::ALL.iter().map(|c| c.label()).collect();
        let prompt = format!("File {} already exists. Overwrite?", path.display());

        let selection = self.suspended(|| {
            Select::with_theme(&self.theme)
                .with_prompt(prompt)
                .items(&labels)
                .default(1)
                .interact_opt()
        })?;

        Ok(selection.and_then(|i| OverwriteChoice::ALL.get(i).copied()))
    }

    fn pick_prompt(&mut self, prompts: &[String]) -> Result<Option<PromptChoice>> {
        let mut items: Vec<&str> = prompts.iter().map(String::as_str).collect();
        items.push(CUSTOM_ITEM);

        let selection = self.suspended(|| {
            Select::with_theme(&self.theme)
                .with_prompt(
                    "Select a system prompt from the library or choose Custom to enter a new one",
                )
                .items(&items)
                .default(0)
                .interact_opt()
        })?;

        Ok(selection.map(|i| {
            if i < prompts.len() {
                PromptChoice::Library(i)
            } else {
                PromptChoice::Custom
            }
        }))
    }

    fn input_text(&mut self, prompt: &str) -> Result<Option<String>> {
        let text: String = self.suspended(|| {
            Input::with_theme(&self.theme)
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()
        })?;

        Ok(Some(text).filter(|t| !t.trim().is_empty()))
    }

    fn report_progress(&mut self, message: &str) {
        self.spinner().set_message(message.to_string());
    }

    fn report_error(&mut self, message: &str) {
        self.suspended(|| eprintln!("✗ {}", message));
    }

    fn report_info(&mut self, message: &str) {
        self.suspended(|| eprintln!("✓ {}", message));
    }
}
