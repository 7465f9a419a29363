//! Request parameters, engine output shapes and the combined result.

use serde::{Deserialize, Serialize};

/// Default upper bound on abstractive summary length (model tokens).
pub const DEFAULT_MAX_LENGTH: u32 = 130;
/// Default lower bound on abstractive summary length (model tokens).
pub const DEFAULT_MIN_LENGTH: u32 = 30;
/// Default minimum extraction length for the extractive summary.
pub const DEFAULT_EXTRACTIVE_MIN_LENGTH: usize = 60;

/// Combined output of both summarizers.
///
/// Both fields are always present; an empty string means the input was empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    /// Normalized abstractive summary.
    pub bart_summary: String,
    /// Normalized extractive summary.
    pub bert_summary: String,
}

impl SummaryResult {
    /// The result returned for empty or whitespace-only input.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            bart_summary: String::new(),
            bert_summary: String::new(),
        }
    }
}

/// Per-call summarization options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryRequestParameters {
    /// Upper bound on generated abstractive tokens.
    pub max_length: u32,
    /// Lower bound on generated abstractive tokens.
    pub min_length: u32,
    /// Minimum extraction length handed to the extractive engine.
    pub extractive_min_length: usize,
    /// Sample stochastically instead of greedy decoding.
    pub do_sample: bool,
}

impl Default for SummaryRequestParameters {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            min_length: DEFAULT_MIN_LENGTH,
            extractive_min_length: DEFAULT_EXTRACTIVE_MIN_LENGTH,
            do_sample: false,
        }
    }
}

impl SummaryRequestParameters {
    /// Whether abstractive decoding must be deterministic.
    #[must_use]
    pub const fn deterministic(&self) -> bool {
        !self.do_sample
    }

    /// Abstractive engine parameters derived from these options.
    #[must_use]
    pub const fn abstractive(&self) -> AbstractiveParams {
        AbstractiveParams {
            max_length: self.max_length,
            min_length: self.min_length,
            deterministic: self.deterministic(),
        }
    }
}

/// Length and decoding constraints for one abstractive call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AbstractiveParams {
    /// Upper bound on generated tokens.
    pub max_length: u32,
    /// Lower bound on generated tokens.
    pub min_length: u32,
    /// Greedy decoding when true.
    pub deterministic: bool,
}

/// One generated summary as returned by an abstractive engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCandidate {
    /// Generated text.
    pub summary_text: String,
}

impl SummaryCandidate {
    /// Wrap generated text.
    #[must_use]
    pub fn new(summary_text: impl Into<String>) -> Self {
        Self {
            summary_text: summary_text.into(),
        }
    }
}

/// Raw output of an extractive engine, which may already be joined.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtractiveOutput {
    /// A single string, returned unchanged.
    Joined(String),
    /// Selected sentences in document order.
    Sentences(Vec<String>),
}

impl ExtractiveOutput {
    /// Collapse either shape into one string. Sentences are joined by a single space.
    #[must_use]
    pub fn normalize(self) -> String {
        match self {
            Self::Joined(text) => text,
            Self::Sentences(sentences) => sentences.join(" "),
        }
    }
}
