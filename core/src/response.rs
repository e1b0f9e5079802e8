//! The per-call response and its JSON normalization.
//!
//! # Design
//! The remote API either answers with a raw payload or wraps it in a JSON
//! envelope carrying crawl metadata next to a `body` field. Normalization
//! hides the difference: envelope metadata moves into `headers`, and `json`
//! always holds the useful payload.
//!
//! Field presence is decided with loose truthiness (`0`, `""`, `"0"`, `[]`,
//! `false` and `null` all count as absent), so an envelope whose
//! `original_status` is `0` is treated like a plain JSON document.

use serde_json::Value;
use tracing::debug;

use crate::headers::{HeaderMap, HeaderValue};

/// Content type that triggers JSON normalization on its own.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Result of one successful call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    /// Raw response body, already content-decoded by the transport.
    pub body: Vec<u8>,
    pub status_code: u16,
    /// Transport headers plus any envelope metadata.
    pub headers: HeaderMap,
    /// Parsed payload. `None` when the body was not treated as JSON,
    /// `Some(Value::Null)` when it was but failed to parse.
    pub json: Option<Value>,
}

impl Response {
    pub fn new(status_code: u16, body: Vec<u8>, headers: HeaderMap) -> Self {
        Self {
            body,
            status_code,
            headers,
            json: None,
        }
    }

    /// UTF-8 view of the body, if it is valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Whether the captured `Content-Type` is exactly the API's JSON type.
    pub fn has_json_content_type(&self) -> bool {
        self.headers
            .get("Content-Type")
            .and_then(HeaderValue::as_str)
            .is_some_and(|ct| ct == JSON_CONTENT_TYPE)
    }

    /// Parse the body as JSON and unwrap the API envelope.
    pub fn normalize_json(&mut self) {
        let parsed: Value = match serde_json::from_slice(&self.body) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "response body is not valid JSON");
                Value::Null
            }
        };

        if is_truthy(parsed.get("original_status")) {
            for field in ["original_status", "pc_status", "url"] {
                let value = parsed.get(field).cloned().unwrap_or(Value::Null);
                self.headers.insert(field, HeaderValue::from_json(value));
            }
        }

        if let Some(remaining) = parsed.get("remaining_requests").filter(|v| is_truthy(Some(*v))) {
            self.headers
                .insert("remaining_requests", HeaderValue::from_json(remaining.clone()));
        }

        self.json = match parsed.get("body") {
            Some(inner) if is_truthy(Some(inner)) => Some(inner.clone()),
            _ => Some(parsed),
        };
    }
}

/// Loose truthiness of an optional JSON value. Objects are always truthy.
pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !(s.is_empty() || s == "0"),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(_)) => true,
    }
}
