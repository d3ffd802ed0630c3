//! Forgiving `serde` field deserializers for model-produced JSON.
//!
//! Models follow the requested shape loosely: numbers come back as
//! `"450 words"`, booleans as `"yes"`, scores as `"4/5"`, enum values as
//! `"Argument"`. These helpers accept the common variants and normalize
//! them. A value with nothing usable in it is still an error.

use serde::de::{Error as _, IntoDeserializer};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Pulls the first decimal number out of a string (`"about 35%"` → `35.0`).
fn first_number(s: &str) -> Option<f64> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let rest = &s[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    rest[..end].trim_end_matches('.').parse().ok()
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => first_number(s),
        _ => None,
    }
}

/// Accepts `true`/`false`, `"yes"`/`"no"`, `"true"`/`"false"` and numbers.
/// Anything else reads as `false`.
pub fn bool_or_yes_no<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "yes" | "true" | "y" | "1"
        ),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    })
}

/// Accepts a number or a string containing one; `None` when absent or
/// unreadable.
pub fn opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    Ok(value
        .as_ref()
        .and_then(value_as_f64)
        .filter(|f| *f >= 0.0 && *f <= f64::from(u32::MAX))
        .map(|f| f.round() as u32))
}

/// Like [`opt_u32`], for a required field. Unreadable values are an error.
pub fn u32_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    opt_u32(deserializer)?.ok_or_else(|| D::Error::custom("expected a non-negative number"))
}

/// Reads a lowercase-named unit enum from any casing (`"Argument"`,
/// `" CAUSALITY "`).
pub fn lowercase_enum<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let canonical = raw.trim().to_ascii_lowercase();
    T::deserialize(IntoDeserializer::<'de, D::Error>::into_deserializer(canonical))
}

/// Accepts a number or a string containing one, as `f32`.
pub fn opt_f32<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    #[allow(clippy::cast_possible_truncation)]
    Ok(value.as_ref().and_then(value_as_f64).map(|f| f as f32))
}

/// Accepts a string or a list of strings; lists are joined with `"; "`.
pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Array(items)) => {
            let parts: Vec<String> = items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    })
}

/// Reads a 1-5 score, clamping out-of-range values. A score with no
/// number in it is an error.
pub fn score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let raw = value_as_f64(&value)
        .ok_or_else(|| D::Error::custom(format!("expected a 1-5 score, got {value}")))?;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(raw.round().clamp(1.0, 5.0) as u8)
}
