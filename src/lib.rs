//! # prompt-mirror
//!
//! Runs every file of a directory tree through a chat-completion model
//! under a chosen system prompt and mirrors the replies into an output tree.
//!
//! ## Features
//!
//! - Depth-first mirror walk with a file-suffix filter
//! - Copy patterns for files that must be copied verbatim
//! - Yes / No / Always / Never overwrite policy for existing outputs
//! - Test runs capped at a couple of files
//! - Advisory cancellation that never aborts an in-flight request
//! - A persistent library of system prompts
//!
//! ## Quick Start
//!
//! ```no_run
//! use prompt_mirror::{CancelFlag, OpenAiClient, ProcessingJob, TerminalUi, walk};
//!
//! # fn main() -> anyhow::Result<()> {
//! let job = ProcessingJob::builder()
//!     .input_root("./docs")
//!     .output_dir("./docs-fr")
//!     .file_suffix_filter(".md")
//!     .system_prompt("Translate this Markdown document to French.")
//!     .api_key(std::env::var("OPENAI_API_KEY")?)
//!     .build()?;
//!
//! let client = OpenAiClient::new(job.client_config())?;
//! let mut ui = TerminalUi::new();
//! let outcome = walk(&job, &client, &mut ui, CancelFlag::new())?;
//! println!("{} files processed", outcome.stats().processed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. **Commands**: gather inputs and settings, build a [`ProcessingJob`]
//! 2. **Walker**: visits the input tree one entry at a time
//! 3. **Pattern matcher / overwrite policy**: decide copy, skip or process
//! 4. **Client**: one chat completion per processed file
//!
//! Dialogs and notifications go through [`UserInteraction`]; settings go
//! through [`SettingsStore`].

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod client;
mod commands;
mod config;
mod error;
mod interaction;
mod overwrite;
mod pattern;
mod settings;
mod terminal;
mod walker;

#[cfg(test)]
mod testing;

pub use client::{ChatClient, ClientConfig, DEFAULT_BASE_URL, OpenAiClient, execute};
pub use commands::{
    SelectionRequest, TreeRequest, add_prompt, list_prompts, process_selection, process_tree,
};
pub use config::{
    OUTPUT_DIR_SUFFIX, ProcessingJob, ProcessingJobBuilder, TEST_RUN_CAP, processed_output_root,
};
pub use error::{Error, Result};
pub use interaction::{OverwriteChoice, PromptChoice, UserInteraction};
pub use overwrite::{OverwriteDecision, OverwriteSettings};
pub use pattern::{CopyMatcher, should_copy_unmodified};
pub use settings::{JsonFileStore, MemoryStore, Settings, SettingsStore};
pub use terminal::TerminalUi;
pub use walker::{CancelFlag, WalkOutcome, WalkStats, Walker, walk};
