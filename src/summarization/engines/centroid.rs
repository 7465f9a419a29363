//! Centroid-based extractive engine.
//!
//! Sentences are embedded and clustered; the sentence nearest each cluster centre
//! is kept, and the selection is returned in document order.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::config::ExtractiveConfig;
use crate::summarization::engines::embedding::SentenceEmbedder;
use crate::summarization::engines::kmeans::{kmeans, squared_distance};
use crate::summarization::engines::sentences::split_sentences;
use crate::summarization::errors::EngineError;
use crate::summarization::extractive::ExtractiveEngine;
use crate::summarization::types::ExtractiveOutput;

const MAX_ITERS: usize = 50;

/// Embedding-clustering sentence extractor.
pub struct CentroidExtractor {
    embedder: Arc<dyn SentenceEmbedder>,
    ratio: f32,
    num_sentences: Option<usize>,
    max_sentence_chars: usize,
    use_first: bool,
    join_output: bool,
}

impl CentroidExtractor {
    /// Create an extractor with default selection settings.
    #[must_use]
    pub fn new(embedder: Arc<dyn SentenceEmbedder>) -> Self {
        Self::from_config(&ExtractiveConfig::default(), embedder)
    }

    /// Create an extractor from configuration.
    #[must_use]
    pub const fn from_config(
        config: &ExtractiveConfig,
        embedder: Arc<dyn SentenceEmbedder>,
    ) -> Self {
        Self {
            embedder,
            ratio: config.ratio,
            num_sentences: config.num_sentences,
            max_sentence_chars: config.max_sentence_chars,
            use_first: config.use_first,
            join_output: config.join_output,
        }
    }

    /// Keep a fixed number of sentences instead of a ratio.
    #[must_use]
    pub const fn with_num_sentences(mut self, n: usize) -> Self {
        self.num_sentences = Some(n);
        self
    }

    /// Toggle forced inclusion of the first sentence.
    #[must_use]
    pub const fn with_use_first(mut self, use_first: bool) -> Self {
        self.use_first = use_first;
        self
    }

    /// Return a joined string rather than a sentence list.
    #[must_use]
    pub const fn with_join_output(mut self, join: bool) -> Self {
        self.join_output = join;
        self
    }

    /// Sentences eligible for selection.
    ///
    /// Length bounds are in characters. When nothing fits, every sentence is
    /// eligible so short inputs still produce a summary.
    fn candidates(&self, sentences: Vec<String>, min_length: usize) -> Vec<String> {
        let bounds = min_length..=self.max_sentence_chars;
        let fitting: Vec<String> = sentences
            .iter()
            .filter(|s| bounds.contains(&s.chars().count()))
            .cloned()
            .collect();

        if fitting.is_empty() {
            debug!(
                sentences = sentences.len(),
                min_length, "no sentence meets the length bounds, using all"
            );
            sentences
        } else {
            fitting
        }
    }

    /// Number of clusters for `n` candidates.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn cluster_count(&self, n: usize) -> usize {
        let k = self.num_sentences.unwrap_or_else(|| {
            let scaled = (self.ratio * n as f32).floor() as usize;
            scaled.max(1)
        });
        k.clamp(1, n.max(1))
    }

    fn select(&self, candidates: &[String]) -> Result<BTreeSet<usize>, EngineError> {
        let k = self.cluster_count(candidates.len());
        if k >= candidates.len() {
            return Ok((0..candidates.len()).collect());
        }

        let vectors = self.embedder.embed(candidates)?;
        if vectors.len() != candidates.len() {
            return Err(EngineError::MalformedResponse(format!(
                "{} returned {} vectors for {} sentences",
                self.embedder.name(),
                vectors.len(),
                candidates.len()
            )));
        }

        let clustering = kmeans(&vectors, k, MAX_ITERS);
        let mut selected = closest_to_centroids(&vectors, &clustering.centroids);
        if self.use_first {
            selected.insert(0);
        }
        Ok(selected)
    }

    fn shape(&self, sentences: Vec<String>) -> ExtractiveOutput {
        if self.join_output {
            ExtractiveOutput::Joined(sentences.join(" "))
        } else {
            ExtractiveOutput::Sentences(sentences)
        }
    }
}

impl ExtractiveEngine for CentroidExtractor {
    fn extract(&self, text: &str, min_length: usize) -> Result<ExtractiveOutput, EngineError> {
        let sentences = split_sentences(text);
        if sentences.is_empty() {
            return Ok(self.shape(Vec::new()));
        }

        let candidates = self.candidates(sentences, min_length);
        let selected = self.select(&candidates)?;

        debug!(
            candidates = candidates.len(),
            selected = selected.len(),
            embedder = self.embedder.name(),
            "extracted sentences"
        );

        let picked = selected
            .into_iter()
            .filter_map(|i| candidates.get(i).cloned())
            .collect();
        Ok(self.shape(picked))
    }

    fn name(&self) -> &str {
        "centroid"
    }
}

/// For each centroid, the nearest point not already taken by an earlier centroid.
fn closest_to_centroids(points: &[Vec<f32>], centroids: &[Vec<f32>]) -> BTreeSet<usize> {
    let mut taken = BTreeSet::new();
    for centroid in centroids {
        let best = points
            .iter()
            .enumerate()
            .filter(|(i, _)| !taken.contains(i))
            .map(|(i, p)| (i, squared_distance(p, centroid)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        if let Some((i, _)) = best {
            taken.insert(i);
        }
    }
    taken
}
