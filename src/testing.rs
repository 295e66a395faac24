//! Scripted fakes shared by the unit tests.

use crate::client::ChatClient;
use crate::error::{Error, Result};
use crate::interaction::{OverwriteChoice, PromptChoice, UserInteraction};
use crate::walker::CancelFlag;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// `UserInteraction` that answers from queues and records notifications.
#[derive(Debug, Default)]
pub(crate) struct ScriptedUi {
    overwrite_answers: VecDeque<Option<OverwriteChoice>>,
    prompt_answers: VecDeque<Option<PromptChoice>>,
    text_answers: VecDeque<Option<String>>,
    fail_overwrite: bool,
    pub(crate) overwrite_prompts: usize,
    pub(crate) overwrite_paths: Vec<PathBuf>,
    pub(crate) offered_prompts: Vec<Vec<String>>,
    pub(crate) text_questions: Vec<String>,
    pub(crate) progress: Vec<String>,
    pub(crate) errors: Vec<String>,
    pub(crate) infos: Vec<String>,
}

impl ScriptedUi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn overwrite(mut self, answer: Option<OverwriteChoice>) -> Self {
        self.overwrite_answers.push_back(answer);
        self
    }

    pub(crate) fn failing_overwrite(mut self) -> Self {
        self.fail_overwrite = true;
        self
    }

    pub(crate) fn prompt(mut self, answer: Option<PromptChoice>) -> Self {
        self.prompt_answers.push_back(answer);
        self
    }

    pub(crate) fn text(mut self, answer: Option<&str>) -> Self {
        self.text_answers.push_back(answer.map(ToString::to_string));
        self
    }
}

impl UserInteraction for ScriptedUi {
    fn confirm_overwrite(&mut self, path: &Path) -> Result<Option<OverwriteChoice>> {
        self.overwrite_prompts += 1;
        self.overwrite_paths.push(path.to_path_buf());
        if self.fail_overwrite {
            return Err(Error::interaction("no terminal"));
        }
        Ok(self.overwrite_answers.pop_front().flatten())
    }

    fn pick_prompt(&mut self, prompts: &[String]) -> Result<Option<PromptChoice>> {
        self.offered_prompts.push(prompts.to_vec());
        Ok(self.prompt_answers.pop_front().flatten())
    }

    fn input_text(&mut self, prompt: &str) -> Result<Option<String>> {
        self.text_questions.push(prompt.to_string());
        Ok(self.text_answers.pop_front().flatten())
    }

    fn report_progress(&mut self, message: &str) {
        self.progress.push(message.to_string());
    }

    fn report_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn report_info(&mut self, message: &str) {
        self.infos.push(message.to_string());
    }
}

/// `ChatClient` that upper-cases payloads and records every call.
#[derive(Debug, Default)]
pub(crate) struct FakeClient {
    fail_on: Vec<String>,
    cancel_after_call: Option<CancelFlag>,
    pub(crate) calls: RefCell<Vec<(String, String)>>,
}

impl FakeClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fails with a transport error when the payload equals `payload`.
    pub(crate) fn failing_on(mut self, payload: &str) -> Self {
        self.fail_on.push(payload.to_string());
        self
    }

    /// Raises `flag` while the call is "in flight".
    pub(crate) fn cancelling(mut self, flag: CancelFlag) -> Self {
        self.cancel_after_call = Some(flag);
        self
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub(crate) fn payloads(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(p, _)| p.clone()).collect()
    }
}

impl ChatClient for FakeClient {
    fn complete(&self, payload: &str, system_prompt: &str) -> Result<String> {
        self.calls
            .borrow_mut()
            .push((payload.to_string(), system_prompt.to_string()));

        if let Some(flag) = &self.cancel_after_call {
            flag.cancel();
        }

        if self.fail_on.iter().any(|p| p == payload) {
            return Err(Error::transport("connection reset"));
        }

        Ok(payload.to_uppercase())
    }
}
