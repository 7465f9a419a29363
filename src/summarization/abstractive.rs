//! Abstractive (generative) summarizer.

use std::sync::Arc;

use tracing::debug;

use crate::summarization::errors::{EngineError, Stage, SummaryError};
use crate::summarization::types::{AbstractiveParams, SummaryCandidate};

/// A sequence-to-sequence summarization engine.
///
/// Calls are blocking; the coordinator runs them on the blocking pool.
pub trait AbstractiveEngine: Send + Sync {
    /// Generate candidate summaries, best first.
    ///
    /// # Errors
    /// Returns an error if inference fails.
    fn summarize(
        &self,
        text: &str,
        params: &AbstractiveParams,
    ) -> Result<Vec<SummaryCandidate>, EngineError>;

    /// Model identifier, for logs.
    fn name(&self) -> &str;
}

/// Produces a single fluent summary bounded by token-length constraints.
#[derive(Clone)]
pub struct AbstractiveSummarizer {
    engine: Arc<dyn AbstractiveEngine>,
}

impl AbstractiveSummarizer {
    /// Wrap an engine handle.
    #[must_use]
    pub const fn new(engine: Arc<dyn AbstractiveEngine>) -> Self {
        Self { engine }
    }

    /// Summarize `text` and return the first candidate's text.
    ///
    /// # Errors
    /// `Configuration` if `min_length > max_length` or `max_length == 0`, checked
    /// before the engine is invoked. `SummarizationFailure` if the engine faults or
    /// yields no candidate.
    pub fn run(
        &self,
        text: &str,
        max_length: u32,
        min_length: u32,
        deterministic: bool,
    ) -> Result<String, SummaryError> {
        let params = AbstractiveParams {
            max_length,
            min_length,
            deterministic,
        };
        validate_bounds(&params)?;

        debug!(
            model = self.engine.name(),
            max_length, min_length, deterministic, "running abstractive summarizer"
        );

        let candidates = self
            .engine
            .summarize(text, &params)
            .map_err(|e| SummaryError::failure(Stage::Abstractive, e))?;

        first_candidate(candidates)
    }
}

pub(crate) fn validate_bounds(params: &AbstractiveParams) -> Result<(), SummaryError> {
    if params.max_length == 0 {
        return Err(SummaryError::Configuration(
            "max_length must be > 0".to_string(),
        ));
    }
    if params.min_length > params.max_length {
        return Err(SummaryError::Configuration(format!(
            "min_length ({}) must not exceed max_length ({})",
            params.min_length, params.max_length
        )));
    }
    Ok(())
}

fn first_candidate(candidates: Vec<SummaryCandidate>) -> Result<String, SummaryError> {
    candidates
        .into_iter()
        .next()
        .map(|candidate| candidate.summary_text)
        .ok_or_else(|| SummaryError::failure(Stage::Abstractive, "engine produced no candidates"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedEngine {
        candidates: Vec<SummaryCandidate>,
        calls: AtomicUsize,
    }

    impl FixedEngine {
        fn new(texts: &[&str]) -> Self {
            Self {
                candidates: texts.iter().map(|t| SummaryCandidate::new(*t)).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl AbstractiveEngine for FixedEngine {
        fn summarize(
            &self,
            _text: &str,
            _params: &AbstractiveParams,
        ) -> Result<Vec<SummaryCandidate>, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.candidates.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingEngine;

    impl AbstractiveEngine for FailingEngine {
        fn summarize(
            &self,
            _text: &str,
            _params: &AbstractiveParams,
        ) -> Result<Vec<SummaryCandidate>, EngineError> {
            Err(EngineError::HttpStatus(503))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_selects_first_candidate() {
        let engine = Arc::new(FixedEngine::new(&["best", "second"]));
        let summarizer = AbstractiveSummarizer::new(engine);
        let summary = summarizer.run("some text", 130, 30, true);
        assert_eq!(summary.ok().as_deref(), Some("best"));
    }

    #[test]
    fn test_min_above_max_rejected_before_engine() {
        let engine = Arc::new(FixedEngine::new(&["unused"]));
        let summarizer = AbstractiveSummarizer::new(engine.clone());

        let result = summarizer.run("some text", 50, 100, true);
        assert!(matches!(result, Err(SummaryError::Configuration(_))));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_max_length_rejected() {
        let engine = Arc::new(FixedEngine::new(&["unused"]));
        let summarizer = AbstractiveSummarizer::new(engine);
        let result = summarizer.run("some text", 0, 0, true);
        assert!(matches!(result, Err(SummaryError::Configuration(_))));
    }

    #[test]
    fn test_no_candidates_is_failure() {
        let engine = Arc::new(FixedEngine::new(&[]));
        let summarizer = AbstractiveSummarizer::new(engine);
        let result = summarizer.run("some text", 130, 30, true);
        assert!(matches!(
            result,
            Err(SummaryError::SummarizationFailure {
                stage: Stage::Abstractive,
                ..
            })
        ));
    }

    #[test]
    fn test_engine_fault_tagged_abstractive() {
        let summarizer = AbstractiveSummarizer::new(Arc::new(FailingEngine));
        let result = summarizer.run("some text", 130, 30, true);
        let stage = result.err().and_then(|e| e.stage());
        assert_eq!(stage, Some(Stage::Abstractive));
    }
}
