use super::models::RawEventRecord;
use crate::error::FlyerResult;
use serde_json::Value;
use tracing::{debug, warn};

/// Key the extractor uses to wrap several events
pub const EVENTS_KEY: &str = "events";

/// Split the extractor's raw text into event records.
///
/// Accepts `{"events": [...]}`, a bare single-event object, or a bare array.
/// Fails only when the text is not JSON at all.
pub fn parse(raw_text: &str) -> FlyerResult<Vec<RawEventRecord>> {
    let document: Value = serde_json::from_str(strip_code_fence(raw_text))?;

    let records: Vec<RawEventRecord> = match document {
        Value::Array(items) => {
            warn!("Extractor returned a bare array, treating each element as an event");
            items.into_iter().map(RawEventRecord::from).collect()
        }
        Value::Object(mut object) => match object.remove(EVENTS_KEY) {
            Some(Value::Array(items)) => items.into_iter().map(RawEventRecord::from).collect(),
            Some(other) => {
                // Not a list, so this is a single event that happens to have that key
                object.insert(EVENTS_KEY.to_string(), other);
                vec![RawEventRecord::from(Value::Object(object))]
            }
            None => vec![RawEventRecord::from(Value::Object(object))],
        },
        other => vec![RawEventRecord::from(other)],
    };

    debug!(records = records.len(), "Parsed extractor response");
    Ok(records)
}

/// Remove a surrounding markdown code fence, if present
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if !(trimmed.starts_with("```") && trimmed.ends_with("```") && trimmed.len() >= 6) {
        return trimmed;
    }

    let inner = &trimmed[3..trimmed.len() - 3];
    // Drop an info string such as `json` on the opening line
    match inner.find('\n') {
        Some(newline) if !inner[..newline].trim_start().starts_with(['{', '[']) => {
            inner[newline + 1..].trim()
        }
        _ => inner.trim(),
    }
}
