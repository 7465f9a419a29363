//! HTTP route handlers for the relay API.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::llm::groq::RelayError;
use crate::summarization::{SummaryError, SummaryRequestParameters, SummaryResult};

use super::state::AppState;

/// Error response: status plus a `{success: false, ...}` body.
type ApiError = (StatusCode, Json<Value>);

/// Create the API router with all routes.
#[must_use]
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/api/chat", post(chat_completion))
        .route("/api/summarize", post(summarize))
        .fallback(not_found)
        .with_state(state)
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "message": "Secura relay server is running",
        "port": state.port,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn not_found() -> ApiError {
    failure(StatusCode::NOT_FOUND, "Endpoint not found")
}

fn failure(status: StatusCode, error: impl Into<String>) -> ApiError {
    (status, Json(json!({ "success": false, "error": error.into() })))
}

fn bad_json(rejection: &JsonRejection) -> ApiError {
    tracing::debug!("rejected request body: {rejection}");
    failure(StatusCode::BAD_REQUEST, "No JSON data provided")
}

/// Chat completion request.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's query.
    #[serde(default)]
    pub query: String,
    /// Optional model override.
    pub model: Option<String>,
}

/// Relay a chat completion.
async fn chat_completion(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload.map_err(|e| bad_json(&e))?;
    if request.query.trim().is_empty() {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            RelayError::EmptyQuery.to_string(),
        ));
    }

    match state.relay.chat(&request.query, request.model.as_deref()).await {
        Ok(outcome) => Ok(Json(json!({
            "success": true,
            "response": outcome.response,
            "model": outcome.model,
            "usage": outcome.usage,
        }))),
        Err(RelayError::EmptyQuery) => Err(failure(
            StatusCode::BAD_REQUEST,
            RelayError::EmptyQuery.to_string(),
        )),
        Err(e) => {
            tracing::error!("chat relay failed: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": format!("Server error: {e}"),
                    "response": "",
                })),
            ))
        }
    }
}

/// One transcript line.
#[derive(Debug, Default, Deserialize)]
pub struct TranscriptMessage {
    /// Speaker name; `Unknown` when absent.
    pub sender: Option<String>,
    /// Message text; empty when absent.
    pub content: Option<String>,
}

/// Summarization request: a transcript plus optional parameter overrides.
#[derive(Debug, Default, Deserialize)]
pub struct SummarizeRequest {
    /// Messages in conversation order.
    #[serde(default)]
    pub messages: Vec<TranscriptMessage>,
    /// Abstractive upper bound override.
    pub max_length: Option<u32>,
    /// Abstractive lower bound override.
    pub min_length: Option<u32>,
    /// Extractive minimum length override.
    pub extractive_min_length: Option<usize>,
    /// Sampling override.
    pub do_sample: Option<bool>,
}

impl SummarizeRequest {
    /// Merge request overrides over `defaults`.
    #[must_use]
    pub fn parameters(&self, defaults: &SummaryRequestParameters) -> SummaryRequestParameters {
        SummaryRequestParameters {
            max_length: self.max_length.unwrap_or(defaults.max_length),
            min_length: self.min_length.unwrap_or(defaults.min_length),
            extractive_min_length: self
                .extractive_min_length
                .unwrap_or(defaults.extractive_min_length),
            do_sample: self.do_sample.unwrap_or(defaults.do_sample),
        }
    }
}

/// Render messages as `sender: content` lines.
#[must_use]
pub fn transcript(messages: &[TranscriptMessage]) -> String {
    messages
        .iter()
        .map(|m| {
            format!(
                "{}: {}",
                m.sender.as_deref().unwrap_or("Unknown"),
                m.content.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Summarize a conversation transcript.
async fn summarize(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<SummaryResult>, ApiError> {
    let Json(request) = payload.map_err(|e| bad_json(&e))?;
    let params = request.parameters(state.coordinator.defaults());
    let text = transcript(&request.messages);

    tracing::info!(messages = request.messages.len(), "summarizing conversation");

    state
        .coordinator
        .generate_with(&text, &params)
        .await
        .map(Json)
        .map_err(|e| match e {
            SummaryError::Configuration(_) => failure(StatusCode::BAD_REQUEST, e.to_string()),
            SummaryError::SummarizationFailure { stage, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": e.to_string(),
                    "stage": stage,
                })),
            ),
        })
}
