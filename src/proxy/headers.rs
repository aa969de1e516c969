//! Header resolution for user-supplied header text.
//!
//! Input is tried as a strict JSON object first. Only when that fails is it
//! scanned line by line as `Name: value` pairs. Resolution never fails; the
//! worst case is an empty map.

use serde_json::{Map, Value};
use std::collections::HashMap;

/// Which parse strategy produced a header map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStrategy {
    Empty,
    Json,
    Lines,
}

/// Resolves free-form header text into a name/value map.
pub fn resolve(raw: &str) -> HashMap<String, String> {
    resolve_with_strategy(raw).1
}

/// Like [`resolve`], also reporting the strategy that was applied.
pub fn resolve_with_strategy(raw: &str) -> (HeaderStrategy, HashMap<String, String>) {
    if raw.trim().is_empty() {
        return (HeaderStrategy::Empty, HashMap::new());
    }

    match serde_json::from_str::<Map<String, Value>>(raw) {
        Ok(object) => (HeaderStrategy::Json, coerce_object(object)),
        Err(_) => (HeaderStrategy::Lines, parse_lines(raw)),
    }
}

/// Converts a JSON object into string pairs; non-string values keep their JSON text.
pub fn coerce_object(object: Map<String, Value>) -> HashMap<String, String> {
    object
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect()
}

fn parse_lines(raw: &str) -> HashMap<String, String> {
    raw.lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || value.is_empty() {
                tracing::trace!(line, "Skipping malformed header line");
                return None;
            }
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}
