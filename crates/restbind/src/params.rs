//! Request parameter extraction
//!
//! Clients submit attributes in one of three ways. Exactly one source is used
//! per request:
//!
//! 1. a JSON body (content type matches [`is_json_content_type`])
//! 2. a JSON document inside the form/query field `model`
//! 3. plain form/query parameters

use crate::error::Result;
use crate::model::Mapping;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Form field that may carry a JSON-encoded object
pub const MODEL_FIELD: &str = "model";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

fn json_media_type() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^\s*(application|text)/([\w.\-]+\+)?json\s*(;|$)")
            .expect("JSON media type pattern is valid")
    })
}

/// Whether a `Content-Type` value denotes JSON.
pub fn is_json_content_type(content_type: &str) -> bool {
    json_media_type().is_match(content_type)
}

fn is_form_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|media| media.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

/// Decode query string and urlencoded body into a field mapping.
///
/// Body fields override query fields; the last of repeated keys wins.
pub fn parse_form_params(
    query: Option<&str>,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<Mapping> {
    let mut params = Mapping::new();

    if let Some(query) = query {
        for (name, value) in serde_urlencoded::from_str::<Vec<(String, String)>>(query)? {
            params.insert(name, Value::String(value));
        }
    }

    if content_type.is_some_and(is_form_content_type) && !body.is_empty() {
        for (name, value) in serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)? {
            params.insert(name, Value::String(value));
        }
    }

    Ok(params)
}

/// Produce the canonical attribute mapping for a request.
pub fn extract_params(content_type: Option<&str>, body: &[u8], parsed: Mapping) -> Result<Mapping> {
    if content_type.is_some_and(is_json_content_type) {
        tracing::debug!("Extracting params from JSON body ({} bytes)", body.len());
        return Ok(serde_json::from_slice::<Mapping>(body)?);
    }

    if let Some(model) = parsed.get(MODEL_FIELD) {
        tracing::debug!("Extracting params from '{}' field", MODEL_FIELD);
        return match model {
            Value::String(raw) => Ok(serde_json::from_str::<Mapping>(raw)?),
            other => Ok(serde_json::from_value::<Mapping>(other.clone())?),
        };
    }

    Ok(parsed)
}
