//! Abstractive engine backed by an Ollama instruction model.

use tracing::debug;

use crate::config::AbstractiveConfig;
use crate::llm::ollama::{GenerateOptions, OllamaClient, OllamaError, detect_num_thread};
use crate::summarization::abstractive::AbstractiveEngine;
use crate::summarization::errors::EngineError;
use crate::summarization::types::{AbstractiveParams, SummaryCandidate};

const SYSTEM_PROMPT: &str = "You summarize conversations and documents. \
Reply with the summary only, as plain prose, without a preamble, headings or lists.";

/// Generative summarizer calling Ollama `/api/generate`.
pub struct OllamaAbstractive {
    client: OllamaClient,
    model: String,
    num_ctx: u32,
    num_thread: u32,
    sample_temperature: f32,
    seed: u64,
}

impl OllamaAbstractive {
    /// Build the engine and its blocking HTTP client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &AbstractiveConfig) -> Result<Self, OllamaError> {
        let client = OllamaClient::new(
            config.base_url.as_str(),
            config.request_timeout,
            config.keep_alive.as_str(),
        )?;
        Ok(Self {
            client,
            model: config.model.clone(),
            num_ctx: config.num_ctx,
            num_thread: detect_num_thread(),
            sample_temperature: config.sample_temperature,
            seed: config.seed,
        })
    }

    /// Underlying client, for readiness checks.
    #[must_use]
    pub const fn client(&self) -> &OllamaClient {
        &self.client
    }

    const fn options(&self, params: &AbstractiveParams) -> GenerateOptions {
        let (temperature, seed) = if params.deterministic {
            (0.0, Some(self.seed))
        } else {
            (self.sample_temperature, None)
        };
        GenerateOptions {
            num_ctx: self.num_ctx,
            num_predict: params.max_length,
            temperature,
            seed,
            num_thread: self.num_thread,
        }
    }
}

fn build_prompt(text: &str, params: &AbstractiveParams) -> String {
    format!(
        "Summarize the following text in at least {} and at most {} tokens.\n\n{}",
        params.min_length, params.max_length, text
    )
}

impl AbstractiveEngine for OllamaAbstractive {
    fn summarize(
        &self,
        text: &str,
        params: &AbstractiveParams,
    ) -> Result<Vec<SummaryCandidate>, EngineError> {
        let prompt = build_prompt(text, params);
        let output = self.client.generate(
            &self.model,
            Some(SYSTEM_PROMPT),
            &prompt,
            &self.options(params),
        )?;

        let candidates: Vec<SummaryCandidate> = output
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(SummaryCandidate::new)
            .into_iter()
            .collect();

        debug!(
            model = %self.model,
            candidates = candidates.len(),
            "ollama generation finished"
        );
        Ok(candidates)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: String) -> AbstractiveConfig {
        AbstractiveConfig {
            model: "mistral".to_string(),
            base_url,
            request_timeout: Duration::from_secs(5),
            ..AbstractiveConfig::default()
        }
    }

    const PARAMS: AbstractiveParams = AbstractiveParams {
        max_length: 130,
        min_length: 30,
        deterministic: true,
    };

    #[test]
    fn test_prompt_states_bounds() {
        let prompt = build_prompt("Body.", &PARAMS);
        assert!(prompt.contains("at least 30"));
        assert!(prompt.contains("at most 130"));
        assert!(prompt.ends_with("Body."));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_deterministic_request_is_greedy_and_seeded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({
                "model": "mistral",
                "options": { "num_predict": 130, "temperature": 0.0, "seed": 42 }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "response": "  They agreed on 3pm.\n" })),
            )
            .mount(&server)
            .await;

        let uri = server.uri();
        let output = tokio::task::spawn_blocking(move || {
            let engine = OllamaAbstractive::from_config(&config(uri)).map_err(EngineError::from)?;
            engine.summarize("Alice: Let's meet at 3pm.\nBob: Works for me.", &PARAMS)
        })
        .await;

        let candidates = output.ok().and_then(Result::ok).unwrap_or_default();
        assert_eq!(candidates, vec![SummaryCandidate::new("They agreed on 3pm.")]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_blank_response_yields_no_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "response": "   " })),
            )
            .mount(&server)
            .await;

        let uri = server.uri();
        let output = tokio::task::spawn_blocking(move || {
            let engine = OllamaAbstractive::from_config(&config(uri)).map_err(EngineError::from)?;
            engine.summarize("text", &PARAMS)
        })
        .await;

        let candidates = output.ok().and_then(Result::ok);
        assert_eq!(candidates, Some(Vec::new()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_status_error_maps_to_engine_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let uri = server.uri();
        let output = tokio::task::spawn_blocking(move || {
            let engine = OllamaAbstractive::from_config(&config(uri)).map_err(EngineError::from)?;
            engine.summarize("text", &PARAMS)
        })
        .await;

        assert!(matches!(output, Ok(Err(EngineError::HttpStatus(404)))));
    }

    #[test]
    fn test_sampling_options_drop_seed() {
        let engine = OllamaAbstractive::from_config(&config("http://localhost:11434".into()));
        let options = engine.map(|e| {
            e.options(&AbstractiveParams {
                deterministic: false,
                ..PARAMS
            })
        });
        let options = options.ok();
        assert_eq!(options.as_ref().and_then(|o| o.seed), None);
        assert!(options.is_some_and(|o| o.temperature > 0.0));
    }

    /// Requires a running Ollama with the default summary model pulled.
    #[test]
    #[ignore = "needs a local Ollama runtime"]
    fn test_live_generation() {
        let engine = OllamaAbstractive::from_config(&AbstractiveConfig::default());
        let candidates = engine
            .map_err(EngineError::from)
            .and_then(|e| e.summarize("Alice: Let's meet at 3pm.\nBob: Works for me.", &PARAMS));
        assert!(candidates.is_ok_and(|c| !c.is_empty()));
    }
}
