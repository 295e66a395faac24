//! The user-facing commands.
//!
//! Each command gathers whatever it still needs through
//! [`UserInteraction`], reads settings once, and hands off to the walker or
//! the chat client. Failures are reported to the user once and returned.

use crate::{
    client::{ChatClient, ClientConfig},
    config::ProcessingJob,
    error::{Error, Result},
    interaction::{PromptChoice, UserInteraction},
    settings::SettingsStore,
    walker::{self, CancelFlag, WalkOutcome},
};
use std::path::PathBuf;
use tracing::{debug, info};

const INPUT_DIR_QUESTION: &str = "Select input directory";
const OUTPUT_DIR_QUESTION: &str = "Select output directory";
const CUSTOM_PROMPT_QUESTION: &str = "Enter the custom system prompt:";
const NEW_PROMPT_QUESTION: &str = "Enter the new system prompt:";

/// Inputs already known when `process_tree` starts. Missing ones are asked
/// for interactively.
#[derive(Debug, Clone, Default)]
pub struct TreeRequest {
    /// Directory to process
    pub input_dir: Option<PathBuf>,
    /// Chosen output directory (`_processed` is appended)
    pub output_dir: Option<PathBuf>,
    /// System prompt, bypassing the library picker
    pub system_prompt: Option<String>,
    /// Overrides the stored API key
    pub api_key: Option<String>,
}

/// Inputs for `process_selection`.
#[derive(Debug, Clone, Default)]
pub struct SelectionRequest {
    /// The selected text
    pub text: String,
    /// System prompt, bypassing the library picker
    pub system_prompt: Option<String>,
    /// Overrides the stored API key
    pub api_key: Option<String>,
}

/// Processes a directory tree.
///
/// Returns `Ok(None)` when the user dismissed one of the dialogs.
///
/// # Errors
///
/// Returns an error if settings cannot be loaded, the job is invalid, the
/// client cannot be built or the input root cannot be read. Per-file
/// failures are reported during the walk and are not errors.
pub fn process_tree<F, C>(
    store: &dyn SettingsStore,
    ui: &mut dyn UserInteraction,
    make_client: F,
    cancel: CancelFlag,
    request: TreeRequest,
) -> Result<Option<WalkOutcome>>
where
    F: FnOnce(ClientConfig) -> Result<C>,
    C: ChatClient,
{
    let result = run_tree(store, ui, make_client, cancel, request);
    notify_failure(ui, result)
}

fn run_tree<F, C>(
    store: &dyn SettingsStore,
    ui: &mut dyn UserInteraction,
    make_client: F,
    cancel: CancelFlag,
    request: TreeRequest,
) -> Result<Option<WalkOutcome>>
where
    F: FnOnce(ClientConfig) -> Result<C>,
    C: ChatClient,
{
    let Some(input_dir) = request_or_ask(request.input_dir, ui, INPUT_DIR_QUESTION)? else {
        return Ok(None);
    };
    let Some(output_dir) = request_or_ask(request.output_dir, ui, OUTPUT_DIR_QUESTION)? else {
        return Ok(None);
    };

    let settings = store.load()?;
    let Some(system_prompt) = resolve_prompt(request.system_prompt, &settings.system_prompts, ui)? else {
        return Ok(None);
    };

    let mut builder = ProcessingJob::builder()
        .settings(&settings)
        .input_root(input_dir)
        .output_dir(output_dir)
        .system_prompt(system_prompt);
    if let Some(api_key) = request.api_key {
        builder = builder.api_key(api_key);
    }
    let job = builder.build()?;

    let client = make_client(job.client_config())?;
    let outcome = walker::walk(&job, &client, ui, cancel)?;

    match outcome {
        WalkOutcome::Completed(stats) => {
            info!("Completed with {:?}", stats);
            ui.report_info("Files processed successfully.");
        }
        WalkOutcome::Cancelled(stats) => {
            info!("Cancelled with {:?}", stats);
            ui.report_info("Processing cancelled.");
        }
    }

    Ok(Some(outcome))
}

/// Sends a piece of selected text through the model once.
///
/// Returns the reply that replaces the selection, or `Ok(None)` when the
/// prompt picker was dismissed.
///
/// # Errors
///
/// Returns an error if the selection is empty, settings cannot be loaded,
/// or the remote call fails.
pub fn process_selection<F, C>(
    store: &dyn SettingsStore,
    ui: &mut dyn UserInteraction,
    make_client: F,
    request: SelectionRequest,
) -> Result<Option<String>>
where
    F: FnOnce(ClientConfig) -> Result<C>,
    C: ChatClient,
{
    let result = run_selection(store, ui, make_client, request);
    notify_failure(ui, result)
}

fn run_selection<F, C>(
    store: &dyn SettingsStore,
    ui: &mut dyn UserInteraction,
    make_client: F,
    request: SelectionRequest,
) -> Result<Option<String>>
where
    F: FnOnce(ClientConfig) -> Result<C>,
    C: ChatClient,
{
    if request.text.trim().is_empty() {
        return Err(Error::config("No text selected"));
    }

    let settings = store.load()?;
    let Some(system_prompt) = resolve_prompt(request.system_prompt, &settings.system_prompts, ui)? else {
        return Ok(None);
    };

    let api_key = request.api_key.unwrap_or(settings.api_key);
    let client = make_client(
        ClientConfig::new(api_key, settings.model).with_base_url(settings.base_url),
    )?;

    ui.report_progress("Processing selection");
    let reply = client.complete(&request.text, &system_prompt)?;
    debug!("Selection reply is {} bytes", reply.len());

    Ok(Some(reply))
}

/// Appends a prompt to the stored library.
///
/// Asks for the text when `text` is `None`. Returns `Ok(false)` if nothing
/// was entered.
///
/// # Errors
///
/// Returns an error if the settings cannot be read or written.
pub fn add_prompt(
    store: &dyn SettingsStore,
    ui: &mut dyn UserInteraction,
    text: Option<String>,
) -> Result<bool> {
    let result = run_add_prompt(store, ui, text);
    notify_failure(ui, result)
}

fn run_add_prompt(
    store: &dyn SettingsStore,
    ui: &mut dyn UserInteraction,
    text: Option<String>,
) -> Result<bool> {
    let text = match text {
        Some(text) => Some(text),
        None => ui.input_text(NEW_PROMPT_QUESTION)?,
    };
    let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
        return Ok(false);
    };

    store.append_prompt(&text)?;
    info!("Added system prompt to the library");
    ui.report_info("System prompt added to the library.");
    Ok(true)
}

/// The stored prompt library, in order.
///
/// # Errors
///
/// Returns an error if the settings cannot be read.
pub fn list_prompts(store: &dyn SettingsStore) -> Result<Vec<String>> {
    Ok(store.load()?.system_prompts)
}

fn request_or_ask(
    given: Option<PathBuf>,
    ui: &mut dyn UserInteraction,
    question: &str,
) -> Result<Option<PathBuf>> {
    if given.is_some() {
        return Ok(given);
    }
    Ok(ui
        .input_text(question)?
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from))
}

/// Picks a system prompt: the explicit one, a library entry, or a freshly
/// typed custom prompt. Empty answers count as dismissal.
fn resolve_prompt(
    given: Option<String>,
    library: &[String],
    ui: &mut dyn UserInteraction,
) -> Result<Option<String>> {
    let prompt = match given {
        Some(prompt) => Some(prompt),
        None => match ui.pick_prompt(library)? {
            Some(PromptChoice::Library(index)) => library.get(index).cloned(),
            Some(PromptChoice::Custom) => ui.input_text(CUSTOM_PROMPT_QUESTION)?,
            None => None,
        },
    };
    Ok(prompt.filter(|p| !p.trim().is_empty()))
}

fn notify_failure<T>(ui: &mut dyn UserInteraction, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        ui.report_error(&e.to_string());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{MemoryStore, Settings};
    use crate::testing::{FakeClient, ScriptedUi};
    use assert_fs::TempDir;
    use assert_fs::prelude::*;

    fn store_with_prompts(prompts: &[&str]) -> MemoryStore {
        MemoryStore::new(Settings {
            system_prompts: prompts.iter().map(ToString::to_string).collect(),
            api_key: "sk-stored".to_string(),
            ..Settings::default()
        })
    }

    #[test]
    fn test_process_tree_asks_for_everything() {
        let temp = TempDir::new().unwrap();
        temp.child("in/a.md").write_str("alpha").unwrap();
        let input = temp.child("in").path().display().to_string();
        let output = temp.child("out").path().display().to_string();

        let store = store_with_prompts(&["Shout", "Whisper"]);
        let mut ui = ScriptedUi::new()
            .text(Some(input.as_str()))
            .text(Some(output.as_str()))
            .prompt(Some(PromptChoice::Library(1)));
        let client = FakeClient::new();

        let outcome = process_tree(
            &store,
            &mut ui,
            |_| Ok(&client),
            CancelFlag::new(),
            TreeRequest::default(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(outcome.stats().processed, 1);
        temp.child("out_processed/a.md").assert("ALPHA");
        assert!(!temp.child("out").exists());
        assert_eq!(client.calls.borrow()[0].1, "Whisper");
        assert_eq!(ui.offered_prompts, vec![vec!["Shout".to_string(), "Whisper".to_string()]]);
        assert_eq!(ui.infos, vec!["Files processed successfully."]);
    }

    #[test]
    fn test_process_tree_custom_prompt() {
        let temp = TempDir::new().unwrap();
        temp.child("in/a.md").write_str("alpha").unwrap();

        let store = store_with_prompts(&[]);
        let mut ui = ScriptedUi::new()
            .prompt(Some(PromptChoice::Custom))
            .text(Some("Be brief"));
        let client = FakeClient::new();
        let request = TreeRequest {
            input_dir: Some(temp.child("in").path().to_path_buf()),
            output_dir: Some(temp.child("out").path().to_path_buf()),
            ..TreeRequest::default()
        };

        process_tree(&store, &mut ui, |_| Ok(&client), CancelFlag::new(), request).unwrap();

        assert_eq!(ui.text_questions, vec![CUSTOM_PROMPT_QUESTION]);
        assert_eq!(client.calls.borrow()[0].1, "Be brief");
    }

    #[test]
    fn test_process_tree_dismissed_dialog_does_nothing() {
        let temp = TempDir::new().unwrap();
        temp.child("in/a.md").write_str("alpha").unwrap();

        let store = store_with_prompts(&["Shout"]);
        let mut ui = ScriptedUi::new().prompt(None);
        let client = FakeClient::new();
        let request = TreeRequest {
            input_dir: Some(temp.child("in").path().to_path_buf()),
            output_dir: Some(temp.child("out").path().to_path_buf()),
            ..TreeRequest::default()
        };

        let outcome =
            process_tree(&store, &mut ui, |_| Ok(&client), CancelFlag::new(), request).unwrap();

        assert!(outcome.is_none());
        assert_eq!(client.call_count(), 0);
        assert!(ui.infos.is_empty() && ui.errors.is_empty());
    }

    #[test]
    fn test_process_tree_uses_settings_and_api_key_override() {
        let temp = TempDir::new().unwrap();
        temp.child("in/a.txt").write_str("alpha").unwrap();
        temp.child("in/b.md").write_str("beta").unwrap();

        let store = MemoryStore::new(Settings {
            file_type: ".txt".to_string(),
            model: "gpt-4".to_string(),
            ..Settings::default()
        });
        let mut ui = ScriptedUi::new();
        let client = FakeClient::new();
        let mut seen = None;
        let request = TreeRequest {
            input_dir: Some(temp.child("in").path().to_path_buf()),
            output_dir: Some(temp.child("out").path().to_path_buf()),
            system_prompt: Some("Shout".to_string()),
            api_key: Some("sk-flag".to_string()),
        };

        process_tree(
            &store,
            &mut ui,
            |config| {
                seen = Some(config);
                Ok(&client)
            },
            CancelFlag::new(),
            request,
        )
        .unwrap();

        let config = seen.unwrap();
        assert_eq!(config.api_key, "sk-flag");
        assert_eq!(config.model, "gpt-4");
        assert_eq!(client.payloads(), vec!["alpha"]);
        assert!(ui.offered_prompts.is_empty());
    }

    #[test]
    fn test_process_tree_reports_cancellation() {
        let temp = TempDir::new().unwrap();
        temp.child("in/a.md").write_str("alpha").unwrap();

        let store = store_with_prompts(&[]);
        let mut ui = ScriptedUi::new();
        let cancel = CancelFlag::new();
        let client = FakeClient::new().cancelling(cancel.clone());
        let request = TreeRequest {
            input_dir: Some(temp.child("in").path().to_path_buf()),
            output_dir: Some(temp.child("out").path().to_path_buf()),
            system_prompt: Some("Shout".to_string()),
            ..TreeRequest::default()
        };

        let outcome = process_tree(&store, &mut ui, |_| Ok(&client), cancel, request)
            .unwrap()
            .unwrap();

        assert!(outcome.is_cancelled());
        assert_eq!(ui.infos, vec!["Processing cancelled."]);
    }

    #[test]
    fn test_process_tree_reports_invalid_job() {
        let temp = TempDir::new().unwrap();
        let store = store_with_prompts(&[]);
        let mut ui = ScriptedUi::new();
        let client = FakeClient::new();
        let request = TreeRequest {
            input_dir: Some(temp.child("missing").path().to_path_buf()),
            output_dir: Some(temp.child("out").path().to_path_buf()),
            system_prompt: Some("Shout".to_string()),
            ..TreeRequest::default()
        };

        let result = process_tree(&store, &mut ui, |_| Ok(&client), CancelFlag::new(), request);

        assert!(result.unwrap_err().is_config());
        assert_eq!(ui.errors.len(), 1);
        assert!(ui.errors[0].contains("does not exist"));
    }

    #[test]
    fn test_process_selection_returns_reply() {
        let store = store_with_prompts(&["Shout"]);
        let mut ui = ScriptedUi::new().prompt(Some(PromptChoice::Library(0)));
        let client = FakeClient::new();
        let mut seen = None;

        let reply = process_selection(
            &store,
            &mut ui,
            |config| {
                seen = Some(config);
                Ok(&client)
            },
            SelectionRequest {
                text: "hello there".to_string(),
                ..SelectionRequest::default()
            },
        )
        .unwrap();

        assert_eq!(reply.as_deref(), Some("HELLO THERE"));
        assert_eq!(client.call_count(), 1);
        assert_eq!(seen.unwrap().api_key, "sk-stored");
    }

    #[test]
    fn test_process_selection_failure_is_single_notification() {
        let store = store_with_prompts(&[]);
        let mut ui = ScriptedUi::new();
        let client = FakeClient::new().failing_on("boom");

        let result = process_selection(
            &store,
            &mut ui,
            |_| Ok(&client),
            SelectionRequest {
                text: "boom".to_string(),
                system_prompt: Some("Shout".to_string()),
                ..SelectionRequest::default()
            },
        );

        assert!(result.unwrap_err().is_remote());
        assert_eq!(ui.errors.len(), 1);
    }

    #[test]
    fn test_process_selection_rejects_empty_text() {
        let store = store_with_prompts(&["Shout"]);
        let mut ui = ScriptedUi::new();
        let client = FakeClient::new();

        let result = process_selection(
            &store,
            &mut ui,
            |_| Ok(&client),
            SelectionRequest::default(),
        );

        assert!(result.is_err());
        assert_eq!(client.call_count(), 0);
    }

    #[test]
    fn test_add_prompt_appends() {
        let store = store_with_prompts(&["first"]);
        let mut ui = ScriptedUi::new().text(Some("second"));

        assert!(add_prompt(&store, &mut ui, None).unwrap());
        assert!(add_prompt(&store, &mut ui, Some("third".to_string())).unwrap());

        assert_eq!(list_prompts(&store).unwrap(), vec!["first", "second", "third"]);
        assert_eq!(ui.text_questions, vec![NEW_PROMPT_QUESTION]);
        assert_eq!(ui.infos.len(), 2);
    }

    #[test]
    fn test_add_prompt_ignores_empty_input() {
        let store = store_with_prompts(&["first"]);
        let mut ui = ScriptedUi::new().text(None);

        assert!(!add_prompt(&store, &mut ui, None).unwrap());
        assert!(!add_prompt(&store, &mut ui, Some("   ".to_string())).unwrap());
        assert_eq!(list_prompts(&store).unwrap(), vec!["first"]);
        assert!(ui.infos.is_empty());
    }

    #[test]
    fn test_resolve_prompt_out_of_range_is_dismissal() {
        let mut ui = ScriptedUi::new().prompt(Some(PromptChoice::Library(5)));
        let prompt = resolve_prompt(None, &["only".to_string()], &mut ui).unwrap();
        assert!(prompt.is_none());
    }
}
