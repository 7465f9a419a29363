//! Configuration for the relay service.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::llm::ollama::DEFAULT_OLLAMA_URL;
use crate::summarization::coordinator::{DEFAULT_MAX_CONCURRENT, DEFAULT_STAGE_TIMEOUT};
use crate::summarization::types::SummaryRequestParameters;

/// Default server port.
pub const DEFAULT_PORT: u16 = 3001;

/// Default chat completion endpoint.
pub const DEFAULT_COMPLETION_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default chat model.
pub const DEFAULT_CHAT_MODEL: &str = "llama-3.3-70b-versatile";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant. Provide concise, accurate answers. Keep responses brief and to the point.";

/// Environment variable names.
pub mod env {
    /// Listening port.
    pub const PORT: &str = "SECURA_PORT";
    /// Completion API key.
    pub const GROQ_API_KEY: &str = "GROQ_API_KEY";
    /// Completion API URL override.
    pub const GROQ_URL: &str = "SECURA_GROQ_URL";
    /// Default chat model.
    pub const CHAT_MODEL: &str = "SECURA_CHAT_MODEL";
    /// Ollama base URL for both summarization engines.
    pub const OLLAMA_URL: &str = "SECURA_OLLAMA_URL";
    /// Abstractive summarization model.
    pub const SUMMARY_MODEL: &str = "SECURA_SUMMARY_MODEL";
    /// Sentence embedder backend (`hashing` or `ollama`).
    pub const EMBEDDER: &str = "SECURA_EMBEDDER";
    /// Per-stage summarization timeout in seconds.
    pub const STAGE_TIMEOUT_SECS: &str = "SECURA_STAGE_TIMEOUT_SECS";
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid or out-of-range value.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Chat completion relay settings.
    pub completion: CompletionConfig,
    /// Summarization settings.
    pub summary: SummaryConfig,
}

impl RelayConfig {
    /// Build configuration from process environment variables over defaults.
    ///
    /// # Errors
    /// Returns an error if a variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup over defaults.
    ///
    /// # Errors
    /// Returns an error if a value cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = lookup(env::PORT) {
            config.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{} is not a port: {port}", env::PORT)))?;
        }
        if let Some(key) = lookup(env::GROQ_API_KEY) {
            config.completion.api_key = Some(key);
        }
        if let Some(url) = lookup(env::GROQ_URL) {
            config.completion.api_url = url;
        }
        if let Some(model) = lookup(env::CHAT_MODEL) {
            config.completion.model = model;
        }
        if let Some(url) = lookup(env::OLLAMA_URL) {
            config.summary.abstractive.base_url.clone_from(&url);
            config.summary.extractive.embedding_base_url = url;
        }
        if let Some(model) = lookup(env::SUMMARY_MODEL) {
            config.summary.abstractive.model = model;
        }
        if let Some(kind) = lookup(env::EMBEDDER) {
            config.summary.extractive.embedder = kind.parse()?;
        }
        if let Some(secs) = lookup(env::STAGE_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("{} must be a number of seconds", env::STAGE_TIMEOUT_SECS))
            })?;
            config.summary.stage_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be > 0".to_string()));
        }

        Url::parse(&self.completion.api_url)?;
        Url::parse(&self.summary.abstractive.base_url)?;
        if self.summary.extractive.embedder == EmbedderKind::Ollama {
            Url::parse(&self.summary.extractive.embedding_base_url)?;
        }

        let defaults = &self.summary.defaults;
        if defaults.max_length == 0 {
            return Err(ConfigError::Invalid(
                "summary.defaults.max_length must be > 0".to_string(),
            ));
        }
        if defaults.min_length > defaults.max_length {
            return Err(ConfigError::Invalid(
                "summary.defaults.min_length must not exceed max_length".to_string(),
            ));
        }

        if self.summary.max_concurrent == 0 {
            return Err(ConfigError::Invalid(
                "summary.max_concurrent must be > 0".to_string(),
            ));
        }
        if self.summary.stage_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "summary.stage_timeout must be > 0".to_string(),
            ));
        }

        let extractive = &self.summary.extractive;
        if extractive.ratio.is_nan() || extractive.ratio <= 0.0 || extractive.ratio > 1.0 {
            return Err(ConfigError::Invalid(
                "summary.extractive.ratio must be in (0, 1]".to_string(),
            ));
        }
        if extractive.hashing_dims == 0 {
            return Err(ConfigError::Invalid(
                "summary.extractive.hashing_dims must be > 0".to_string(),
            ));
        }
        if extractive.num_sentences == Some(0) {
            return Err(ConfigError::Invalid(
                "summary.extractive.num_sentences must be > 0 when set".to_string(),
            ));
        }

        Ok(())
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listening port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

/// Chat completion relay settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Chat completions endpoint.
    pub api_url: String,
    /// Bearer token; requests fail with `MissingApiKey` when unset.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Default model.
    pub model: String,
    /// System prompt sent ahead of every query.
    pub system_prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum completion tokens.
    pub max_tokens: u32,
    /// Request timeout.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_COMPLETION_URL.to_string(),
            api_key: None,
            model: DEFAULT_CHAT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: 0.7,
            max_tokens: 500,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Summarization settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Parameters applied when a request does not override them.
    pub defaults: SummaryRequestParameters,
    /// Timeout applied to each stage.
    #[serde(with = "duration_serde")]
    pub stage_timeout: Duration,
    /// Maximum concurrent summarization calls.
    pub max_concurrent: usize,
    /// Abstractive engine settings.
    pub abstractive: AbstractiveConfig,
    /// Extractive engine settings.
    pub extractive: ExtractiveConfig,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            defaults: SummaryRequestParameters::default(),
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            abstractive: AbstractiveConfig::default(),
            extractive: ExtractiveConfig::default(),
        }
    }
}

/// Abstractive engine (Ollama generate) settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AbstractiveConfig {
    /// Ollama model name.
    pub model: String,
    /// Ollama base URL.
    pub base_url: String,
    /// Context window passed as `num_ctx`.
    pub num_ctx: u32,
    /// Temperature used when sampling is requested.
    pub sample_temperature: f32,
    /// Seed used for deterministic decoding.
    pub seed: u64,
    /// How long Ollama keeps the model resident.
    pub keep_alive: String,
    /// HTTP timeout for one generation.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for AbstractiveConfig {
    fn default() -> Self {
        Self {
            model: "mistral:7b-instruct-q8_0".to_string(),
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            num_ctx: 8_192,
            sample_temperature: 0.7,
            seed: 42,
            keep_alive: "1h".to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Sentence embedder backend for extractive summarization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedderKind {
    /// Local feature-hashed bag of words.
    #[default]
    Hashing,
    /// Ollama embedding model.
    Ollama,
}

impl FromStr for EmbedderKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hashing" => Ok(Self::Hashing),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Invalid(format!(
                "unknown embedder '{other}', expected 'hashing' or 'ollama'"
            ))),
        }
    }
}

/// Extractive engine (centroid clustering) settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractiveConfig {
    /// Share of candidate sentences to keep.
    pub ratio: f32,
    /// Fixed number of sentences; overrides `ratio` when set.
    pub num_sentences: Option<usize>,
    /// Sentences longer than this are not candidates.
    pub max_sentence_chars: usize,
    /// Always keep the first candidate sentence.
    pub use_first: bool,
    /// Return one joined string instead of a sentence list.
    pub join_output: bool,
    /// Sentence embedder backend.
    pub embedder: EmbedderKind,
    /// Buckets for the hashing embedder.
    pub hashing_dims: usize,
    /// Ollama embedding model.
    pub embedding_model: String,
    /// Ollama base URL for embeddings.
    pub embedding_base_url: String,
}

impl Default for ExtractiveConfig {
    fn default() -> Self {
        Self {
            ratio: 0.2,
            num_sentences: None,
            max_sentence_chars: 600,
            use_first: true,
            join_output: false,
            embedder: EmbedderKind::Hashing,
            hashing_dims: 512,
            embedding_model: "nomic-embed-text".to_string(),
            embedding_base_url: DEFAULT_OLLAMA_URL.to_string(),
        }
    }
}

/// Serde module for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.completion.model, "llama-3.3-70b-versatile");
        assert_eq!(config.summary.defaults.max_length, 130);
        assert_eq!(config.summary.extractive.embedder, EmbedderKind::Hashing);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = RelayConfig::from_lookup(lookup_from(&[
            ("SECURA_PORT", "8080"),
            ("GROQ_API_KEY", "gsk_test"),
            ("SECURA_OLLAMA_URL", "http://10.0.0.2:11434"),
            ("SECURA_EMBEDDER", "ollama"),
            ("SECURA_STAGE_TIMEOUT_SECS", "15"),
        ]));
        assert!(config.is_ok());
        let config = config.unwrap_or_default();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.completion.api_key.as_deref(), Some("gsk_test"));
        assert_eq!(config.summary.abstractive.base_url, "http://10.0.0.2:11434");
        assert_eq!(config.summary.extractive.embedding_base_url, "http://10.0.0.2:11434");
        assert_eq!(config.summary.extractive.embedder, EmbedderKind::Ollama);
        assert_eq!(config.summary.stage_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_bad_port_rejected() {
        let config = RelayConfig::from_lookup(lookup_from(&[("SECURA_PORT", "not-a-port")]));
        assert!(matches!(config, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_embedder_rejected() {
        assert!("bert".parse::<EmbedderKind>().is_err());
        assert_eq!("Ollama".parse::<EmbedderKind>().ok(), Some(EmbedderKind::Ollama));
    }

    #[test]
    fn test_validate_rejects_inverted_defaults() {
        let mut config = RelayConfig::default();
        config.summary.defaults.min_length = 200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_ratio_and_url() {
        let mut config = RelayConfig::default();
        config.summary.extractive.ratio = 0.0;
        assert!(config.validate().is_err());
        config.summary.extractive.ratio = f32::NAN;
        assert!(config.validate().is_err());

        let mut bad_url = RelayConfig::default();
        bad_url.completion.api_url = "not a url".to_string();
        assert!(matches!(bad_url.validate(), Err(ConfigError::Url(_))));
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut config = RelayConfig::default();
        config.completion.api_key = Some("secret".to_string());
        let json = serde_json::to_string(&config).unwrap_or_default();
        assert!(!json.contains("secret"));
    }
}
