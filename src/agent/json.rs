//! JSON extraction from free-text model output.
//!
//! Models wrap their JSON in fences, prefix it with prose, or both.
//! Candidates are tried in a fixed order and the first one that parses
//! wins:
//!
//! 1. a fenced block labelled `json`
//! 2. any fenced block
//! 3. the first balanced `{...}` span (string-aware), then the span from
//!    the first `{` to the last `}`

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::LlmError;

static JSON_FENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```json[ \t]*\r?\n?(.*?)```").ok());

static ANY_FENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").ok());

/// Extracts the first parseable JSON value from `content`.
///
/// # Errors
///
/// Returns [`LlmError::Parse`] carrying the raw content if no candidate
/// parses.
pub fn extract_json(content: &str) -> Result<Value, LlmError> {
    let mut found_candidate = false;
    for candidate in candidates(content) {
        found_candidate = true;
        if let Ok(value) = serde_json::from_str::<Value>(candidate.trim()) {
            return Ok(value);
        }
    }
    let message = if found_candidate {
        "JSON-like content in model output did not parse"
    } else {
        "no JSON found in model output"
    };
    Err(LlmError::parse(message, content))
}

/// Extracts JSON from `content` and deserializes it into `T`.
///
/// # Errors
///
/// Returns [`LlmError::Parse`] if no JSON is found or it does not have
/// the shape of `T`.
pub fn parse_json<T: DeserializeOwned>(content: &str) -> Result<T, LlmError> {
    let value = extract_json(content)?;
    serde_json::from_value(value)
        .map_err(|e| LlmError::parse(format!("unexpected JSON shape: {e}"), content))
}

/// Serializes a prior-stage result for embedding in a prompt.
pub fn to_prompt_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// Pretty-printed variant of [`to_prompt_json`].
pub fn to_prompt_json_pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

fn candidates(content: &str) -> Vec<&str> {
    let mut out = Vec::new();
    for re in [&*JSON_FENCE, &*ANY_FENCE].into_iter().flatten() {
        if let Some(m) = re.captures(content).and_then(|c| c.get(1)) {
            out.push(m.as_str());
        }
    }
    if let Some(span) = balanced_object(content) {
        out.push(span);
    }
    if let Some(span) = greedy_object(content) {
        out.push(span);
    }
    out
}

/// First `{...}` span whose braces balance, ignoring braces inside strings.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0_usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Span from the first `{` to the last `}`.
fn greedy_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
