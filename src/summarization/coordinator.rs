//! Runs both summarizers over the same text and merges their outputs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::summarization::abstractive::{AbstractiveSummarizer, validate_bounds};
use crate::summarization::errors::{Stage, SummaryError};
use crate::summarization::extractive::ExtractiveSummarizer;
use crate::summarization::types::{SummaryRequestParameters, SummaryResult};

/// Default per-stage timeout.
pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(120);
/// Default number of `generate` calls allowed to run inference at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Single entry point combining both summarizers into one result.
pub struct SummaryCoordinator {
    abstractive: AbstractiveSummarizer,
    extractive: ExtractiveSummarizer,
    defaults: SummaryRequestParameters,
    stage_timeout: Duration,
    permits: Arc<Semaphore>,
}

impl SummaryCoordinator {
    /// Create a coordinator owning both summarizers, with default parameters.
    #[must_use]
    pub fn new(abstractive: AbstractiveSummarizer, extractive: ExtractiveSummarizer) -> Self {
        Self {
            abstractive,
            extractive,
            defaults: SummaryRequestParameters::default(),
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
            permits: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT)),
        }
    }

    /// Override the parameters used by [`Self::generate`].
    #[must_use]
    pub const fn with_defaults(mut self, defaults: SummaryRequestParameters) -> Self {
        self.defaults = defaults;
        self
    }

    /// Override the per-stage timeout.
    #[must_use]
    pub const fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Bound the number of concurrent `generate` calls.
    ///
    /// A permit is held until both engine jobs of a call have returned, including
    /// jobs that outlive a stage timeout.
    #[must_use]
    pub fn with_max_concurrent(mut self, limit: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(limit.max(1)));
        self
    }

    /// Parameters used by [`Self::generate`].
    #[must_use]
    pub const fn defaults(&self) -> &SummaryRequestParameters {
        &self.defaults
    }

    /// Summarize `text` with the default parameters.
    ///
    /// # Errors
    /// See [`Self::generate_with`].
    pub async fn generate(&self, text: &str) -> Result<SummaryResult, SummaryError> {
        let params = self.defaults;
        self.generate_with(text, &params).await
    }

    /// Summarize `text` with explicit parameters.
    ///
    /// Whitespace-only input short-circuits to an empty result without touching
    /// either engine. Otherwise both stages run concurrently on the trimmed text
    /// and both must succeed.
    ///
    /// # Errors
    /// `Configuration` for invalid length bounds, `SummarizationFailure` tagged
    /// with the failing stage. When both stages fail the abstractive error wins.
    pub async fn generate_with(
        &self,
        text: &str,
        params: &SummaryRequestParameters,
    ) -> Result<SummaryResult, SummaryError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(SummaryResult::empty());
        }
        validate_bounds(&params.abstractive())?;

        let request_id = Uuid::new_v4();
        let span = info_span!("summarize", %request_id, chars = trimmed.len());
        self.run_stages(Arc::from(trimmed), *params)
            .instrument(span)
            .await
    }

    async fn run_stages(
        &self,
        text: Arc<str>,
        params: SummaryRequestParameters,
    ) -> Result<SummaryResult, SummaryError> {
        let permit = Arc::new(
            Arc::clone(&self.permits)
                .acquire_owned()
                .await
                .map_err(|_| SummaryError::Configuration("summarizer pool is closed".to_string()))?,
        );

        let started = Instant::now();

        let abstractive = {
            let summarizer = self.abstractive.clone();
            let text = Arc::clone(&text);
            let held = Arc::clone(&permit);
            self.run_stage(Stage::Abstractive, move || {
                let summary = summarizer.run(
                    &text,
                    params.max_length,
                    params.min_length,
                    params.deterministic(),
                );
                drop(held);
                summary
            })
        };
        let extractive = {
            let summarizer = self.extractive.clone();
            let text = Arc::clone(&text);
            let held = Arc::clone(&permit);
            self.run_stage(Stage::Extractive, move || {
                let summary = summarizer.run(&text, params.extractive_min_length);
                drop(held);
                summary
            })
        };
        drop(permit);

        let (abstractive_out, extractive_out) = tokio::join!(abstractive, extractive);
        let result = SummaryResult {
            bart_summary: abstractive_out?,
            bert_summary: extractive_out?,
        };

        info!(
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "summaries generated"
        );
        Ok(result)
    }

    async fn run_stage<F>(&self, stage: Stage, job: F) -> Result<String, SummaryError>
    where
        F: FnOnce() -> Result<String, SummaryError> + Send + 'static,
    {
        let handle = tokio::task::spawn_blocking(job);
        let outcome = match tokio::time::timeout(self.stage_timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(SummaryError::failure(
                stage,
                format!("worker did not complete: {join_error}"),
            )),
            Err(_) => Err(SummaryError::failure(
                stage,
                format!("timed out after {}s", self.stage_timeout.as_secs_f32()),
            )),
        };

        if let Err(e) = &outcome {
            warn!(%stage, "stage failed: {e}");
        }
        outcome
    }
}
