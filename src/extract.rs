//! Response extraction: turns raw model text into the pieces each stage needs.

use crate::error::ParseError;
use serde_json::Value;

/// Field holding the activity spec in stage-one output
pub const SPEC_FIELD: &str = "spec";

/// Parse stage-one output and return its `spec` field.
///
/// The raw text must be a JSON object. A single surrounding Markdown fence
/// (```` ```json ```` or bare ```` ``` ````) is tolerated.
pub fn parse_structured(raw: &str) -> Result<String, ParseError> {
    let body = strip_code_fence(raw);
    let value: Value =
        serde_json::from_str(body).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    let object = value.as_object().ok_or(ParseError::NotAnObject)?;
    match object.get(SPEC_FIELD) {
        Some(Value::String(spec)) => Ok(spec.clone()),
        Some(_) => Err(ParseError::FieldNotString(SPEC_FIELD.to_string())),
        None => Err(ParseError::MissingField(SPEC_FIELD.to_string())),
    }
}

/// Return the text strictly between the first `opener` and the next `closer` after it.
pub fn parse_delimited(raw: &str, opener: &str, closer: &str) -> Result<String, ParseError> {
    let start = raw
        .find(opener)
        .map(|idx| idx + opener.len())
        .ok_or_else(|| ParseError::MissingOpener(opener.to_string()))?;
    let rest = &raw[start..];
    let end = rest
        .find(closer)
        .ok_or_else(|| ParseError::MissingCloser(closer.to_string()))?;
    Ok(rest[..end].to_string())
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = inner.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening fence line.
    match inner.find('\n') {
        Some(newline) => inner[newline + 1..].trim(),
        None => inner
            .trim_start_matches(|c: char| c.is_ascii_alphanumeric())
            .trim(),
    }
}
