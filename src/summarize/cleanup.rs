//! Response cleanup shared by the local-model summarizers.

use crate::error::SummarizationError;
use regex::Regex;
use std::sync::LazyLock;

/// Greedy on purpose: everything from the first `<think>` to the last
/// `</think>` goes, including any text between two trace blocks.
static REASONING_TRACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*</think>").expect("reasoning trace pattern"));

/// Remove the reasoning trace and surrounding whitespace.
pub fn strip_reasoning(text: &str) -> String {
    REASONING_TRACE.replace_all(text, "").trim().to_string()
}

/// [`strip_reasoning`], failing when nothing is left.
pub fn clean_response(backend: &str, text: &str) -> Result<String, SummarizationError> {
    let cleaned = strip_reasoning(text);
    if cleaned.is_empty() {
        return Err(SummarizationError::EmptyResponse {
            backend: backend.to_string(),
        });
    }
    Ok(cleaned)
}
