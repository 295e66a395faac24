//! Chat-completion client.
//!
//! This is the only network boundary of the crate. One call sends exactly
//! two messages (system prompt, then payload) and returns the text of the
//! first choice.

use crate::error::{Error, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Performs one chat completion per call.
pub trait ChatClient {
    /// Sends `payload` as the user message under `system_prompt` and returns
    /// the reply text.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyResponse`] if the first choice has no text
    /// - [`Error::Auth`] if the credentials are rejected
    /// - [`Error::Transport`] / [`Error::Api`] for network or status failures
    fn complete(&self, payload: &str, system_prompt: &str) -> Result<String>;
}

impl<C: ChatClient + ?Sized> ChatClient for &C {
    fn complete(&self, payload: &str, system_prompt: &str) -> Result<String> {
        (**self).complete(payload, system_prompt)
    }
}

impl<C: ChatClient + ?Sized> ChatClient for Box<C> {
    fn complete(&self, payload: &str, system_prompt: &str) -> Result<String> {
        (**self).complete(payload, system_prompt)
    }
}

/// Connection settings for [`OpenAiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Bearer token
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Endpoint root, without the trailing `/chat/completions`
    pub base_url: String,
}

impl ClientConfig {
    /// Creates a config for the default endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Overrides the endpoint root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Blocking client for OpenAI-compatible `/chat/completions` endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: ClientConfig,
    http_client: Client,
}

impl OpenAiClient {
    /// Creates a client.
    ///
    /// No request timeout is set; a hanging endpoint hangs the caller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] for an empty API key and [`Error::Transport`]
    /// if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::auth(
                "No API key configured. Set `apiKey` in the settings file or OPENAI_API_KEY",
            ));
        }

        let http_client = Client::builder()
            .timeout(None::<std::time::Duration>)
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Model this client sends requests for.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

impl ChatClient for OpenAiClient {
    #[instrument(skip(self, payload, system_prompt), fields(model = %self.config.model), level = "debug")]
    fn complete(&self, payload: &str, system_prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: payload,
                },
            ],
        };

        let response = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Auth {
                    message: format!("status {}: {}", status.as_u16(), message),
                },
                _ => Error::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let json: Value = response.json()?;
        debug!("Received completion ({} choices)", json["choices"].as_array().map_or(0, Vec::len));

        extract_reply(&json)
    }
}

/// Pulls `choices[0].message.content` out of a completion body.
fn extract_reply(json: &Value) -> Result<String> {
    json["choices"][0]["message"]["content"]
        .as_str()
        .filter(|content| !content.is_empty())
        .map(ToString::to_string)
        .ok_or(Error::EmptyResponse)
}

/// Builds a client from `api_key` and `model` and performs a single call.
///
/// # Errors
///
/// See [`ChatClient::complete`] and [`OpenAiClient::new`].
pub fn execute(payload: &str, system_prompt: &str, api_key: &str, model: &str) -> Result<String> {
    OpenAiClient::new(ClientConfig::new(api_key, model))?.complete(payload, system_prompt)
}
