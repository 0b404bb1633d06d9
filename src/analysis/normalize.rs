//! Cleanup of raw model output into JSON.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::AnalysisError;

// Opening fences may carry a language tag (```json, ```JSON5 ...). A tag
// only counts when it runs to the end of its line.
static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:[A-Za-z0-9_+\-]*[ \t]*(?:\r?\n|$))?").expect("static regex")
});

/// Remove every markdown code fence marker and trim the result.
pub fn strip_code_fences(raw: &str) -> String {
    FENCE.replace_all(raw, "").trim().to_string()
}

/// Strip fences and parse the remainder strictly as JSON.
pub fn normalize(raw: &str) -> Result<Value, AnalysisError> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str(&cleaned).map_err(|e| {
        let preview: String = cleaned.chars().take(120).collect();
        AnalysisError::InvalidAiResponse(format!("{} (response began: {:?})", e, preview))
    })
}
