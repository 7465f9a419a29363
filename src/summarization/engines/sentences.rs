//! Sentence segmentation for extractive summarization.

use std::sync::LazyLock;

use regex::Regex;

/// A run of text up to and including terminal punctuation (plus closing quotes or
/// brackets), or a trailing run without any terminator.
static SENTENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"[^.!?]*[.!?]+["')\]]*|[^.!?]+$"#).ok());

/// Split text into trimmed, non-empty sentences in document order.
///
/// Line breaks always end a sentence, so each transcript line is at least one
/// sentence even without punctuation.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<String> {
    text.lines()
        .flat_map(split_line)
        .filter(|s| !s.is_empty())
        .collect()
}

fn split_line(line: &str) -> Vec<String> {
    let line = line.trim();
    if line.is_empty() {
        return Vec::new();
    }
    SENTENCE.as_ref().map_or_else(
        || vec![line.to_string()],
        |re| {
            re.find_iter(line)
                .map(|m| m.as_str().trim().to_string())
                .collect()
        },
    )
}
