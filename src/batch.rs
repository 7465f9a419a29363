//! Relay a list of queries loaded from a file.
//!
//! `.json` files hold an array of strings or of `{query, model?}` objects. Any
//! other file is read one query per line; blank lines and `#` comments are skipped.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::llm::groq::{ChatOutcome, ChatRelay, RelayError};

/// Errors raised while loading a batch file.
#[derive(Debug, Error)]
pub enum BatchError {
    /// File could not be read.
    #[error("failed to read batch file: {0}")]
    Io(#[from] std::io::Error),
    /// JSON batch file did not parse.
    #[error("invalid JSON batch file: {0}")]
    Json(#[from] serde_json::Error),
    /// No queries found.
    #[error("batch file contains no queries")]
    Empty,
}

/// One query to relay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchQuery {
    /// Query text.
    pub query: String,
    /// Optional model override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl From<String> for BatchQuery {
    fn from(query: String) -> Self {
        Self { query, model: None }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonEntry {
    Plain(String),
    Full(BatchQuery),
}

/// Result of relaying one query.
#[derive(Clone, Debug, Serialize)]
pub struct BatchOutcome {
    /// Query as sent.
    pub query: String,
    /// Whether the relay succeeded.
    pub success: bool,
    /// Model output; empty on failure.
    pub response: String,
    /// Failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Completion time.
    pub completed_at: DateTime<Utc>,
}

impl BatchOutcome {
    fn new(query: &str, result: Result<ChatOutcome, RelayError>) -> Self {
        let (success, response, error) = result.map_or_else(
            |e| (false, String::new(), Some(e.to_string())),
            |chat| (true, chat.response, None),
        );
        Self {
            query: query.to_string(),
            success,
            response,
            error,
            completed_at: Utc::now(),
        }
    }
}

/// Load queries from `path`.
///
/// # Errors
/// Returns an error if the file cannot be read, is malformed JSON, or holds no queries.
pub fn load_queries(path: impl AsRef<Path>) -> Result<Vec<BatchQuery>, BatchError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        parse_json(&raw)
    } else {
        parse_lines(&raw)
    }
}

/// Parse a JSON array of strings or `{query, model?}` objects.
///
/// # Errors
/// Returns an error on malformed JSON or when no non-blank query remains.
pub fn parse_json(raw: &str) -> Result<Vec<BatchQuery>, BatchError> {
    let entries: Vec<JsonEntry> = serde_json::from_str(raw)?;
    let queries = entries
        .into_iter()
        .map(|entry| match entry {
            JsonEntry::Plain(query) => BatchQuery::from(query),
            JsonEntry::Full(query) => query,
        })
        .filter(|q| !q.query.trim().is_empty())
        .collect();
    non_empty(queries)
}

/// Parse one query per line.
///
/// # Errors
/// Returns an error when no query remains after skipping blanks and comments.
pub fn parse_lines(raw: &str) -> Result<Vec<BatchQuery>, BatchError> {
    let queries = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| BatchQuery::from(line.to_string()))
        .collect();
    non_empty(queries)
}

fn non_empty(queries: Vec<BatchQuery>) -> Result<Vec<BatchQuery>, BatchError> {
    if queries.is_empty() {
        Err(BatchError::Empty)
    } else {
        Ok(queries)
    }
}

/// Relay each query in order. A failed query is recorded and the batch continues.
pub async fn run_batch(relay: &dyn ChatRelay, queries: &[BatchQuery]) -> Vec<BatchOutcome> {
    let mut outcomes = Vec::with_capacity(queries.len());

    for (index, item) in queries.iter().enumerate() {
        let result = relay.chat(&item.query, item.model.as_deref()).await;
        if let Err(e) = &result {
            warn!(index, "query failed: {e}");
        }
        outcomes.push(BatchOutcome::new(&item.query, result));
    }

    let succeeded = outcomes.iter().filter(|o| o.success).count();
    info!(total = outcomes.len(), succeeded, "batch finished");
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct UpperRelay;

    #[async_trait]
    impl ChatRelay for UpperRelay {
        async fn chat(&self, query: &str, _model: Option<&str>) -> Result<ChatOutcome, RelayError> {
            if query.contains("boom") {
                return Err(RelayError::NoChoices);
            }
            Ok(ChatOutcome {
                response: query.to_uppercase(),
                model: "test".to_string(),
                usage: serde_json::json!({}),
            })
        }
    }

    #[test]
    fn test_parse_lines_skips_blanks_and_comments() {
        let queries = parse_lines("# header\nfirst\n\n  second  \n#skip\n").unwrap_or_default();
        let texts: Vec<&str> = queries.iter().map(|q| q.query.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_parse_json_mixed_entries() {
        let raw = r#"["plain", {"query": "with model", "model": "m2"}, "  "]"#;
        let queries = parse_json(raw).unwrap_or_default();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0], BatchQuery::from("plain".to_string()));
        assert_eq!(queries[1].model.as_deref(), Some("m2"));
    }

    #[test]
    fn test_empty_and_malformed_inputs() {
        assert!(matches!(parse_lines("\n# only comments\n"), Err(BatchError::Empty)));
        assert!(matches!(parse_json("[]"), Err(BatchError::Empty)));
        assert!(matches!(parse_json("{"), Err(BatchError::Json(_))));
    }

    #[test]
    fn test_load_queries_by_extension() {
        let dir = std::env::temp_dir().join(format!("secura-batch-{}", uuid::Uuid::new_v4()));
        assert!(std::fs::create_dir_all(&dir).is_ok());

        let json_path = dir.join("queries.json");
        let text_path = dir.join("queries.txt");
        assert!(std::fs::write(&json_path, r#"["a", "b"]"#).is_ok());
        assert!(std::fs::write(&text_path, "[\"not json\"]\n").is_ok());

        assert_eq!(load_queries(&json_path).map(|q| q.len()).ok(), Some(2));
        let lines = load_queries(&text_path).unwrap_or_default();
        assert_eq!(lines[0].query, "[\"not json\"]");

        assert!(matches!(load_queries(dir.join("missing.txt")), Err(BatchError::Io(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_run_batch_continues_after_failure() {
        let queries = parse_lines("hello\nboom\nbye").unwrap_or_default();
        let outcomes = run_batch(&UpperRelay, &queries).await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].success);
        assert_eq!(outcomes[0].response, "HELLO");
        assert!(!outcomes[1].success);
        assert!(outcomes[1].error.is_some());
        assert_eq!(outcomes[2].response, "BYE");
    }
}
