//! Extractive (sentence-selection) summarizer.

use std::sync::Arc;

use tracing::debug;

use crate::summarization::errors::{EngineError, Stage, SummaryError};
use crate::summarization::types::ExtractiveOutput;

/// A sentence-extraction engine. Calls are blocking.
pub trait ExtractiveEngine: Send + Sync {
    /// Select representative sentences from `text`.
    ///
    /// # Errors
    /// Returns an error if extraction fails.
    fn extract(&self, text: &str, min_length: usize) -> Result<ExtractiveOutput, EngineError>;

    /// Engine identifier, for logs.
    fn name(&self) -> &str;
}

/// Selects and concatenates a subset of the original sentences.
#[derive(Clone)]
pub struct ExtractiveSummarizer {
    engine: Arc<dyn ExtractiveEngine>,
}

impl ExtractiveSummarizer {
    /// Wrap an engine handle.
    #[must_use]
    pub const fn new(engine: Arc<dyn ExtractiveEngine>) -> Self {
        Self { engine }
    }

    /// Run extraction and normalize the engine's output into one string.
    ///
    /// # Errors
    /// `SummarizationFailure` tagged `extractive` if the engine faults.
    pub fn run(&self, text: &str, min_length: usize) -> Result<String, SummaryError> {
        debug!(engine = self.engine.name(), min_length, "running extractive summarizer");

        let raw = self
            .engine
            .extract(text, min_length)
            .map_err(|e| SummaryError::failure(Stage::Extractive, e))?;

        Ok(raw.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubEngine(ExtractiveOutput);

    impl ExtractiveEngine for StubEngine {
        fn extract(&self, _text: &str, _min_length: usize) -> Result<ExtractiveOutput, EngineError> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    struct ThrowingEngine;

    impl ExtractiveEngine for ThrowingEngine {
        fn extract(&self, _text: &str, _min_length: usize) -> Result<ExtractiveOutput, EngineError> {
            Err(EngineError::Inference("tokenizer crashed".to_string()))
        }

        fn name(&self) -> &str {
            "throwing"
        }
    }

    #[test]
    fn test_sentence_list_joined_in_order() {
        let engine = StubEngine(ExtractiveOutput::Sentences(vec![
            "Sentence A.".to_string(),
            "Sentence B.".to_string(),
        ]));
        let summarizer = ExtractiveSummarizer::new(Arc::new(engine));
        let summary = summarizer.run("ignored", 60);
        assert_eq!(summary.ok().as_deref(), Some("Sentence A. Sentence B."));
    }

    #[test]
    fn test_joined_string_unchanged() {
        let engine = StubEngine(ExtractiveOutput::Joined("Already joined.".to_string()));
        let summarizer = ExtractiveSummarizer::new(Arc::new(engine));
        let summary = summarizer.run("ignored", 60);
        assert_eq!(summary.ok().as_deref(), Some("Already joined."));
    }

    #[test]
    fn test_empty_sentence_list_is_empty_string() {
        let engine = StubEngine(ExtractiveOutput::Sentences(Vec::new()));
        let summarizer = ExtractiveSummarizer::new(Arc::new(engine));
        assert_eq!(summarizer.run("ignored", 60).ok().as_deref(), Some(""));
    }

    #[test]
    fn test_engine_fault_tagged_extractive() {
        let summarizer = ExtractiveSummarizer::new(Arc::new(ThrowingEngine));
        let stage = summarizer.run("text", 60).err().and_then(|e| e.stage());
        assert_eq!(stage, Some(Stage::Extractive));
    }
}
