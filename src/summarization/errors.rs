//! Error types for the summarization subsystem.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::llm::ollama::OllamaError;

/// One of the two independent summarizer invocations within a `generate` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Generative, paraphrasing summarizer.
    Abstractive,
    /// Sentence-selection summarizer.
    Extractive,
}

impl Stage {
    /// Stable string form used in logs and API responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Abstractive => "abstractive",
            Self::Extractive => "extractive",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced to callers of the summarizers and the coordinator.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Invalid length-bound parameters. Raised before any engine call.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// An engine produced no usable output or faulted during inference.
    #[error("{stage} summarization failed: {reason}")]
    SummarizationFailure {
        /// Stage that failed.
        stage: Stage,
        /// Human-readable cause.
        reason: String,
    },
}

impl SummaryError {
    /// Build a stage failure from any displayable cause.
    #[must_use]
    pub fn failure(stage: Stage, reason: impl fmt::Display) -> Self {
        Self::SummarizationFailure {
            stage,
            reason: reason.to_string(),
        }
    }

    /// Stage tag, if this is a stage failure.
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::SummarizationFailure { stage, .. } => Some(*stage),
            Self::Configuration(_) => None,
        }
    }
}

/// Faults raised by the underlying inference engines.
#[derive(Debug, Error)]
pub enum EngineError {
    /// HTTP client error talking to a model runtime.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
    /// Model runtime answered with a non-success status.
    #[error("model runtime http status not ok: {0}")]
    HttpStatus(u16),
    /// Model runtime answered with something we could not use.
    #[error("malformed engine response: {0}")]
    MalformedResponse(String),
    /// Local inference fault.
    #[error("inference error: {0}")]
    Inference(String),
}

impl From<OllamaError> for EngineError {
    fn from(value: OllamaError) -> Self {
        match value {
            OllamaError::HttpStatusNotOk(status) => Self::HttpStatus(status),
            OllamaError::HttpMalformedResponse(detail) => Self::MalformedResponse(detail),
            OllamaError::HttpClient(err) => Self::Http(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Abstractive.to_string(), "abstractive");
        assert_eq!(Stage::Extractive.to_string(), "extractive");
    }

    #[test]
    fn test_failure_carries_stage() {
        let err = SummaryError::failure(Stage::Extractive, "boom");
        assert_eq!(err.stage(), Some(Stage::Extractive));
        assert_eq!(err.to_string(), "extractive summarization failed: boom");
    }

    #[test]
    fn test_configuration_has_no_stage() {
        let err = SummaryError::Configuration("min_length > max_length".to_string());
        assert_eq!(err.stage(), None);
    }

    #[test]
    fn test_ollama_errors_map_to_engine_errors() {
        let err = EngineError::from(OllamaError::HttpStatusNotOk(503));
        assert!(matches!(err, EngineError::HttpStatus(503)));

        let err = EngineError::from(OllamaError::HttpMalformedResponse("no field".into()));
        assert_eq!(err.to_string(), "malformed engine response: no field");
    }
}
