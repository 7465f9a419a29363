//! Concrete summarization engines and their wiring from configuration.

pub mod centroid;
pub mod embedding;
pub mod kmeans;
pub mod ollama_abstractive;
pub mod sentences;

use std::sync::Arc;

use tracing::info;

use crate::config::{EmbedderKind, ExtractiveConfig, SummaryConfig};
use crate::llm::ollama::{OllamaClient, OllamaError};
use crate::summarization::abstractive::AbstractiveSummarizer;
use crate::summarization::coordinator::SummaryCoordinator;
use crate::summarization::extractive::ExtractiveSummarizer;

pub use centroid::CentroidExtractor;
pub use embedding::{HashingEmbedder, OllamaEmbedder, SentenceEmbedder};
pub use ollama_abstractive::OllamaAbstractive;

/// Build the sentence embedder selected by configuration.
///
/// # Errors
/// Returns an error if the Ollama HTTP client cannot be built.
pub fn build_embedder(
    config: &ExtractiveConfig,
    timeout: std::time::Duration,
) -> Result<Arc<dyn SentenceEmbedder>, OllamaError> {
    let embedder: Arc<dyn SentenceEmbedder> = match config.embedder {
        EmbedderKind::Hashing => Arc::new(HashingEmbedder::new(config.hashing_dims)),
        EmbedderKind::Ollama => {
            let client = OllamaClient::new(config.embedding_base_url.as_str(), timeout, "5m")?;
            Arc::new(OllamaEmbedder::new(client, config.embedding_model.as_str()))
        }
    };
    Ok(embedder)
}

/// Build a coordinator with both engines loaded from configuration.
///
/// Engines hold blocking HTTP clients; call this before entering the async runtime.
///
/// # Errors
/// Returns an error if an HTTP client cannot be built.
pub fn build_coordinator(config: &SummaryConfig) -> Result<SummaryCoordinator, OllamaError> {
    let abstractive = OllamaAbstractive::from_config(&config.abstractive)?;
    let embedder = build_embedder(&config.extractive, config.stage_timeout)?;

    info!(
        abstractive = %config.abstractive.model,
        embedder = embedder.name(),
        "summarization engines loaded"
    );

    let extractive = CentroidExtractor::from_config(&config.extractive, embedder);
    Ok(SummaryCoordinator::new(
        AbstractiveSummarizer::new(Arc::new(abstractive)),
        ExtractiveSummarizer::new(Arc::new(extractive)),
    )
    .with_defaults(config.defaults)
    .with_stage_timeout(config.stage_timeout)
    .with_max_concurrent(config.max_concurrent))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_embedder_respects_kind() {
        let mut config = ExtractiveConfig::default();
        let hashing = build_embedder(&config, std::time::Duration::from_secs(1));
        assert_eq!(hashing.map(|e| e.name().to_string()).ok().as_deref(), Some("hashing"));

        config.embedder = EmbedderKind::Ollama;
        let ollama = build_embedder(&config, std::time::Duration::from_secs(1));
        assert_eq!(
            ollama.map(|e| e.name().to_string()).ok().as_deref(),
            Some("nomic-embed-text")
        );
    }

    #[test]
    fn test_build_coordinator_applies_defaults() {
        let mut config = SummaryConfig::default();
        config.defaults.max_length = 90;
        let coordinator = build_coordinator(&config);
        assert_eq!(coordinator.map(|c| c.defaults().max_length).ok(), Some(90));
    }
}
