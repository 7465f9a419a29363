//! LLM runtime clients.
//!
//! - `groq`: async chat completion relay (`OpenAI`-compatible API)
//! - `ollama`: blocking client for the local model runtime used by summarization

pub mod groq;
pub mod ollama;

pub use groq::{ChatOutcome, ChatRelay, CompletionClient, RelayError};
pub use ollama::{GenerateOptions, OllamaClient, OllamaError};
