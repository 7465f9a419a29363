//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::llm::groq::ChatRelay;
use crate::summarization::SummaryCoordinator;

/// Shared application state.
pub struct AppState {
    /// Dual-pipeline summarizer.
    pub coordinator: SummaryCoordinator,
    /// Chat completion relay.
    pub relay: Arc<dyn ChatRelay>,
    /// Port the server listens on, reported by the health endpoint.
    pub port: u16,
}

impl AppState {
    /// Bundle the services into shared state.
    #[must_use]
    pub fn new(coordinator: SummaryCoordinator, relay: Arc<dyn ChatRelay>, port: u16) -> Arc<Self> {
        Arc::new(Self {
            coordinator,
            relay,
            port,
        })
    }
}
