//! Startup helpers for the relay server.

use std::process::ExitCode;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{ConfigError, RelayConfig};
use crate::llm::groq::{CompletionClient, RelayError};
use crate::llm::ollama::{OllamaClient, OllamaError};
use crate::server::{self, AppState};
use crate::summarization::build_coordinator;

/// Errors raised while assembling the application.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// A summarization engine client could not be built.
    #[error("summarization engine error: {0}")]
    Engine(#[from] OllamaError),
    /// The completion client could not be built.
    #[error("completion client error: {0}")]
    Relay(#[from] RelayError),
}

/// Install the global `tracing` subscriber (`RUST_LOG` over an `info` default).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

/// Run the server until Ctrl+C.
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    init_tracing();

    tracing::info!("Starting Secura relay v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_config() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::from(1);
        }
    };

    // Engines own blocking HTTP clients and must exist before the runtime does.
    let state = match initialize(&config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to create state: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(server::run_server_with_shutdown(state, shutdown_signal())) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    tracing::info!("Server stopped");
    ExitCode::SUCCESS
}

/// Load and validate configuration from the environment.
///
/// # Errors
/// Returns an error if a variable is malformed or a value is out of range.
pub fn load_config() -> Result<RelayConfig, StartupError> {
    let config = RelayConfig::from_env()?;
    config.validate()?;
    Ok(config)
}

/// Build application state from configuration without starting the server.
///
/// Must be called outside of an async context.
///
/// # Errors
/// Returns an error if an HTTP client cannot be built.
pub fn initialize(config: &RelayConfig) -> Result<Arc<AppState>, StartupError> {
    probe_ollama(config);

    let coordinator = build_coordinator(&config.summary)?;
    let relay = CompletionClient::new(&config.completion)?;
    if relay.has_api_key() {
        tracing::info!(model = relay.default_model(), "chat relay configured");
    } else {
        tracing::warn!("GROQ_API_KEY is not set, /api/chat will fail");
    }

    Ok(AppState::new(coordinator, Arc::new(relay), config.server.port))
}

/// Log whether the summarization runtime answers. Never fatal.
fn probe_ollama(config: &RelayConfig) {
    let base_url = config.summary.abstractive.base_url.as_str();
    let ready = OllamaClient::new(base_url, std::time::Duration::from_secs(3), "5m")
        .and_then(|client| client.is_ready());
    match ready {
        Ok(true) => tracing::info!("Ollama endpoint ready: {base_url}"),
        Ok(false) => tracing::warn!("Ollama endpoint not ready: {base_url}"),
        Err(e) => tracing::warn!("Ollama endpoint unreachable ({base_url}): {e}"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
