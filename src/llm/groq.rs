//! Chat completion relay to an `OpenAI`-compatible endpoint (Groq by default).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::CompletionConfig;

/// Errors that can occur while relaying a chat completion.
#[derive(Debug, Error)]
pub enum RelayError {
    /// No API key configured.
    #[error("GROQ_API_KEY not found in environment variables")]
    MissingApiKey,
    /// Query was empty after trimming.
    #[error("Query field is required and cannot be empty")]
    EmptyQuery,
    /// HTTP request failed.
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Remote API answered with a non-success status.
    #[error("Completion API returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// Remote API answered without any choice.
    #[error("No response from completion API")]
    NoChoices,
}

/// A relayed completion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatOutcome {
    /// Assistant text of the first choice.
    pub response: String,
    /// Model that produced it.
    pub model: String,
    /// Token usage as reported by the API, `{}` when absent.
    pub usage: serde_json::Value,
}

/// Anything that can relay a single query to a completion model.
#[async_trait]
pub trait ChatRelay: Send + Sync {
    /// Relay `query`, optionally overriding the model.
    ///
    /// # Errors
    /// Returns an error if the query is empty or the remote call fails.
    async fn chat(&self, query: &str, model: Option<&str>) -> Result<ChatOutcome, RelayError>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Async client for the completion API.
pub struct CompletionClient {
    http: Client,
    api_url: String,
    api_key: Option<SecretString>,
    default_model: String,
    system_prompt: String,
    temperature: f32,
    max_tokens: u32,
}

impl CompletionClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &CompletionConfig) -> Result<Self, RelayError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key: config
                .api_key
                .as_ref()
                .filter(|key| !key.trim().is_empty())
                .map(|key| SecretString::new(key.clone())),
            default_model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Whether an API key is configured.
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Model used when the caller does not pick one.
    #[must_use]
    pub fn default_model(&self) -> &str {
        &self.default_model
    }
}

#[async_trait]
impl ChatRelay for CompletionClient {
    async fn chat(&self, query: &str, model: Option<&str>) -> Result<ChatOutcome, RelayError> {
        let api_key = self.api_key.as_ref().ok_or(RelayError::MissingApiKey)?;
        let query = query.trim();
        if query.is_empty() {
            return Err(RelayError::EmptyQuery);
        }
        let default_model: &str = &self.default_model;
        let model = model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(default_model);

        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: query,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(model, chars = query.len(), "relaying chat completion");

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(status = status.as_u16(), "completion API returned an error");
            return Err(RelayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(RelayError::NoChoices)?;

        Ok(ChatOutcome {
            response: content,
            model: model.to_string(),
            usage: body
                .usage
                .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new())),
        })
    }
}
