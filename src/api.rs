//! LLM completion API interaction.
//!
//! This module provides the interface to an OpenAI-compatible chat
//! completion endpoint (DeepSeek by default).
//!
//! # Architecture
//!
//! - [`CompletionProvider`]: Core trait defining a single async completion
//! - [`ChatClient`]: `reqwest` implementation speaking `/chat/completions`
//!
//! There is deliberately no retry layer: a failed completion simply yields no
//! records for that subject on this run.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// A chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// "system", "user" or "assistant".
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A single completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponseRaw {
    #[serde(default)]
    choices: Vec<ChoiceRaw>,
}

#[derive(Debug, Deserialize)]
struct ChoiceRaw {
    message: ChoiceMessageRaw,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessageRaw {
    #[serde(default)]
    content: Option<String>,
}

/// Trait for a blocking-per-call LLM completion.
///
/// Implementors send one request and return the text of the first choice.
pub trait CompletionProvider {
    /// Send one chat request to the model.
    ///
    /// # Arguments
    ///
    /// * `request` - Model name, messages and sampling temperature
    ///
    /// # Returns
    ///
    /// The content of the first choice, or an error if the request failed,
    /// the endpoint answered with a non-success status, or no choice came back.
    async fn complete(&self, request: &ChatRequest) -> Result<String, Box<dyn Error>>;
}

/// `reqwest` client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ChatClient {
    /// Build a client whose every call is bounded by `timeout`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root, with or without a trailing `/`
    /// * `api_key` - Bearer token; requests are sent unauthenticated without one
    /// * `timeout` - Upper bound for a whole request, connect to last byte
    ///
    /// # Returns
    ///
    /// The client, or an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, Box<dyn Error>> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl CompletionProvider for ChatClient {
    #[instrument(level = "info", skip_all, fields(model = %request.model))]
    async fn complete(&self, request: &ChatRequest) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();

        let mut builder = self.http.post(self.endpoint()).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, elapsed_ms = t0.elapsed().as_millis() as u64, "Completion API error");
            return Err(format!("completion API returned {}: {}", status, body).into());
        }

        let raw: ChatResponseRaw = response.json().await?;
        let content = raw
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or("completion response had no choices")?;

        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            bytes = content.len(),
            "Completion received"
        );
        Ok(content)
    }
}
