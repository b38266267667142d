//! Lenient decoder for semi-structured model output.
//!
//! Text-generation models are asked for JSON but make no guarantees about the
//! shape of what comes back: markdown fences, leading prose, trailing
//! commentary, or nothing parseable at all. Every call site decodes through a
//! three-tier strategy:
//!
//! 1. parse the entire trimmed text as the expected shape;
//! 2. scan for the first well-matched bracketed substring and parse that;
//! 3. fall back to a caller-supplied default factory.
//!
//! Decoding never fails and is fully deterministic: the same input always
//! yields the same value.

use serde_json::{Map, Value};

/// Decode a JSON array from free-form model text.
///
/// Falls back to `default` when no array can be recovered.
pub fn decode_list<F>(raw: &str, default: F) -> Vec<Value>
where
    F: FnOnce() -> Vec<Value>,
{
    let trimmed = raw.trim();

    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
        return items;
    }

    if let Some(candidate) = first_balanced(trimmed, '[', ']') {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(candidate) {
            return items;
        }
    }

    tracing::debug!(len = raw.len(), "no JSON array recovered, using default");
    default()
}

/// Decode a JSON object from free-form model text.
///
/// Falls back to `default` when no object can be recovered.
pub fn decode_object<F>(raw: &str, default: F) -> Map<String, Value>
where
    F: FnOnce() -> Map<String, Value>,
{
    let trimmed = raw.trim();

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        return map;
    }

    if let Some(candidate) = first_balanced(trimmed, '{', '}') {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(candidate) {
            return map;
        }
    }

    tracing::debug!(len = raw.len(), "no JSON object recovered, using default");
    default()
}

/// Find the first balanced `open..close` substring, skipping bracket
/// characters that appear inside JSON string literals.
fn first_balanced(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
