//! Dual-pipeline summarization for conversation transcripts.
//!
//! Organized into:
//! - `types`: Request parameters, engine output shapes and the combined result
//! - `errors`: Stage tags, summary and engine errors
//! - `abstractive`: Generative summarizer over an `AbstractiveEngine`
//! - `extractive`: Sentence-selection summarizer over an `ExtractiveEngine`
//! - `coordinator`: Runs both summarizers concurrently and merges their outputs
//! - `engines`: Ollama-backed generation and centroid sentence extraction

pub mod abstractive;
pub mod coordinator;
pub mod engines;
pub mod errors;
pub mod extractive;
pub mod types;

pub use abstractive::{AbstractiveEngine, AbstractiveSummarizer};
pub use coordinator::SummaryCoordinator;
pub use engines::build_coordinator;
pub use errors::{EngineError, Stage, SummaryError};
pub use extractive::{ExtractiveEngine, ExtractiveSummarizer};
pub use types::{
    AbstractiveParams, ExtractiveOutput, SummaryCandidate, SummaryRequestParameters, SummaryResult,
};
