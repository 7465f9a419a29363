//! Blocking client for a local Ollama runtime.
//!
//! Used by the summarization engines, which run on the blocking pool:
//! - `GET /api/version` readiness probe.
//! - `POST /api/generate` non-streaming generation with explicit runtime options.
//! - `POST /api/embed` batch sentence embeddings.
//!
//! The client must be built outside of an async context.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default Ollama base URL.
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// HTTP connect timeout.
const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Default thread count if `available_parallelism()` is unavailable.
const DEFAULT_NUM_THREAD: u32 = 8;

/// Errors produced by the Ollama client.
#[derive(Debug)]
pub enum OllamaError {
    /// HTTP response was not a success.
    HttpStatusNotOk(u16),
    /// The response body did not contain the expected fields.
    HttpMalformedResponse(String),
    /// HTTP client error when using the blocking client.
    HttpClient(reqwest::Error),
}

impl From<reqwest::Error> for OllamaError {
    fn from(value: reqwest::Error) -> Self {
        Self::HttpClient(value)
    }
}

impl fmt::Display for OllamaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpStatusNotOk(status) => write!(f, "ollama http status not ok: {status}"),
            Self::HttpMalformedResponse(detail) => {
                write!(f, "ollama http response malformed: {detail}")
            }
            Self::HttpClient(err) => write!(f, "http client error: {err}"),
        }
    }
}

impl std::error::Error for OllamaError {}

/// Runtime options forwarded with a generate request.
#[derive(Clone, Debug, Serialize)]
pub struct GenerateOptions {
    /// Context window.
    pub num_ctx: u32,
    /// Maximum number of generated tokens.
    pub num_predict: u32,
    /// Sampling temperature; 0 means greedy.
    pub temperature: f32,
    /// Fixed seed for reproducible sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// CPU threads used for inference.
    pub num_thread: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    keep_alive: &'a str,
    options: &'a GenerateOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Blocking Ollama client.
pub struct OllamaClient {
    client: Client,
    base_url: String,
    keep_alive: String,
}

impl OllamaClient {
    /// Create a client for `base_url` with an overall request timeout.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        keep_alive: impl Into<String>,
    ) -> Result<Self, OllamaError> {
        let client = Client::builder()
            .connect_timeout(IO_TIMEOUT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            keep_alive: keep_alive.into(),
        })
    }

    /// Base URL this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the runtime answers its version endpoint.
    ///
    /// # Errors
    /// Returns an error if the runtime cannot be reached.
    pub fn is_ready(&self) -> Result<bool, OllamaError> {
        let url = format!("{}/api/version", self.base_url);
        let response = self.client.get(&url).send()?;
        Ok(response.status().is_success())
    }

    /// Run a non-streaming generation and return the raw model output.
    ///
    /// `Ok(None)` means the runtime answered without a `response` field.
    ///
    /// # Errors
    /// Returns an error if the request fails or the status is not a success.
    pub fn generate(
        &self,
        model: &str,
        system: Option<&str>,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<Option<String>, OllamaError> {
        let request = GenerateRequest {
            model,
            prompt,
            system,
            stream: false,
            keep_alive: &self.keep_alive,
            options,
        };

        let url = format!("{}/api/generate", self.base_url);
        let response = self.client.post(&url).json(&request).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(OllamaError::HttpStatusNotOk(status.as_u16()));
        }

        let body: GenerateResponse = response.json()?;
        Ok(body.response)
    }

    /// Embed a batch of inputs, one vector per input, in input order.
    ///
    /// # Errors
    /// Returns an error if the request fails or the vector count does not match.
    pub fn embed(&self, model: &str, inputs: &[String]) -> Result<Vec<Vec<f32>>, OllamaError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&EmbedRequest {
                model,
                input: inputs,
            })
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(OllamaError::HttpStatusNotOk(status.as_u16()));
        }

        let body: EmbedResponse = response.json()?;
        if body.embeddings.len() != inputs.len() {
            return Err(OllamaError::HttpMalformedResponse(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                body.embeddings.len()
            )));
        }
        Ok(body.embeddings)
    }
}

/// Number of CPU threads to request for inference.
#[must_use]
pub fn detect_num_thread() -> u32 {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .map_or(DEFAULT_NUM_THREAD, |v| u32::try_from(v).unwrap_or(u32::MAX))
}
