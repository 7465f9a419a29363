//! Sentence embedders used by the centroid extractor.

use std::sync::LazyLock;

use regex::Regex;

use crate::llm::ollama::OllamaClient;
use crate::summarization::errors::EngineError;

/// Trait abstraction over sentence embedding models. Calls are blocking.
pub trait SentenceEmbedder: Send + Sync {
    /// Embed each sentence, returning vectors in input order.
    ///
    /// # Errors
    /// Returns an error if the embedding backend fails.
    fn embed(&self, sentences: &[String]) -> Result<Vec<Vec<f32>>, EngineError>;

    /// Backend identifier, for logs.
    fn name(&self) -> &str;
}

static WORD: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\w+").ok());

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Local embedder: lowercase unigrams and bigrams hashed into fixed buckets.
///
/// Deterministic across runs and platforms, needs no model download.
#[derive(Clone, Debug)]
pub struct HashingEmbedder {
    dims: usize,
}

impl HashingEmbedder {
    /// Create an embedder with `dims` buckets (at least one).
    #[must_use]
    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }

    /// Vector dimensionality.
    #[must_use]
    pub const fn dims(&self) -> usize {
        self.dims
    }

    fn bucket(&self, token: &str) -> usize {
        let dims = u64::try_from(self.dims).unwrap_or(u64::MAX);
        usize::try_from(fnv1a(token.as_bytes()) % dims).unwrap_or(0)
    }

    fn embed_one(&self, sentence: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dims];
        let tokens: Vec<String> = WORD.as_ref().map_or_else(Vec::new, |re| {
            re.find_iter(sentence)
                .map(|m| m.as_str().to_lowercase())
                .collect()
        });

        for token in &tokens {
            vector[self.bucket(token)] += 1.0;
        }
        for pair in tokens.windows(2) {
            vector[self.bucket(&format!("{} {}", pair[0], pair[1]))] += 0.5;
        }

        l2_normalize(&mut vector);
        vector
    }
}

impl SentenceEmbedder for HashingEmbedder {
    fn embed(&self, sentences: &[String]) -> Result<Vec<Vec<f32>>, EngineError> {
        Ok(sentences.iter().map(|s| self.embed_one(s)).collect())
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

/// Embedder backed by an Ollama embedding model.
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
}

impl OllamaEmbedder {
    /// Wrap a client and model name.
    #[must_use]
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

impl SentenceEmbedder for OllamaEmbedder {
    fn embed(&self, sentences: &[String]) -> Result<Vec<Vec<f32>>, EngineError> {
        self.client
            .embed(&self.model, sentences)
            .map_err(EngineError::from)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut *vector {
            *x /= norm;
        }
    }
}
