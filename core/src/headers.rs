//! Response header capture.
//!
//! # Design
//! Transports hand over raw header lines one at a time through
//! `HeaderHandler`, the same way a streaming HTTP engine reports them while
//! the transfer is running. `HeaderMap` is the only handler the client uses:
//! it splits each line on the first colon, coerces numeric values to
//! integers and keeps entries in arrival order.
//!
//! The map also receives envelope metadata (`original_status`, `pc_status`,
//! `url`, `remaining_requests`) lifted out of JSON bodies, so values are not
//! limited to strings.

use std::fmt;

use serde_json::Value;

/// A captured header value.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    /// A numeric-looking header, truncated to an integer.
    Integer(i64),
    Text(String),
    /// Envelope metadata that is neither an integer nor a string.
    Json(Value),
}

impl HeaderValue {
    /// Coerce a trimmed raw header value.
    pub fn from_raw(raw: &str) -> Self {
        match coerce_numeric(raw) {
            Some(n) => HeaderValue::Integer(n),
            None => HeaderValue::Text(raw.to_string()),
        }
    }

    /// Convert a JSON value lifted from a response envelope.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Number(ref n) if n.is_i64() => HeaderValue::Integer(n.as_i64().unwrap_or_default()),
            Value::String(s) => HeaderValue::Text(s),
            other => HeaderValue::Json(other),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HeaderValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Integer(n) => write!(f, "{n}"),
            HeaderValue::Text(s) => f.write_str(s),
            HeaderValue::Json(v) => write!(f, "{v}"),
        }
    }
}

/// Receives raw header lines as a transport reads them.
///
/// Returns the number of bytes consumed. Implementations must accept every
/// line, including the status line and the blank terminator, so a malformed
/// header never aborts the transfer.
pub trait HeaderHandler {
    fn on_header_line(&mut self, line: &str) -> usize;
}

/// Ordered header name → value map.
///
/// Names are compared ASCII case-insensitively; a later insert with the same
/// name replaces the earlier value in its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderMap {
    entries: Vec<(String, HeaderValue)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: HeaderValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl HeaderHandler for HeaderMap {
    fn on_header_line(&mut self, line: &str) -> usize {
        if let Some((name, value)) = parse_header_line(line) {
            self.insert(name, value);
        }
        line.len()
    }
}

/// Split a raw header line on its first colon.
///
/// Returns `None` for lines without a colon or with an empty name.
pub fn parse_header_line(line: &str) -> Option<(String, HeaderValue)> {
    let (name, rest) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), HeaderValue::from_raw(rest.trim())))
}

/// Integer value of a numeric string, truncating decimals and exponents.
fn coerce_numeric(raw: &str) -> Option<i64> {
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }
    // f64 parsing also accepts "inf" and "NaN"; only digits, signs, dots and
    // exponents count here.
    let looks_numeric = raw.bytes().any(|b| b.is_ascii_digit())
        && raw
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !looks_numeric {
        return None;
    }
    raw.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_is_kept_as_text() {
        let (name, value) = parse_header_line("Content-Type: application/json; charset=utf-8\r\n").unwrap();
        assert_eq!(name, "Content-Type");
        assert_eq!(value, HeaderValue::Text("application/json; charset=utf-8".to_string()));
    }

    #[test]
    fn numeric_value_becomes_integer() {
        let (name, value) = parse_header_line("remaining_requests: 42").unwrap();
        assert_eq!(name, "remaining_requests");
        assert_eq!(value, HeaderValue::Integer(42));
    }

    #[test]
    fn value_with_colons_is_rejoined() {
        let (name, value) = parse_header_line("url: http://example.com:8080/a").unwrap();
        assert_eq!(name, "url");
        assert_eq!(value.as_str(), Some("http://example.com:8080/a"));
    }

    #[test]
    fn decimal_and_exponent_values_are_truncated() {
        assert_eq!(HeaderValue::from_raw("4.7"), HeaderValue::Integer(4));
        assert_eq!(HeaderValue::from_raw("1e3"), HeaderValue::Integer(1000));
        assert_eq!(HeaderValue::from_raw("-12"), HeaderValue::Integer(-12));
    }

    #[test]
    fn words_that_parse_as_floats_stay_text() {
        assert_eq!(HeaderValue::from_raw("inf"), HeaderValue::Text("inf".to_string()));
        assert_eq!(HeaderValue::from_raw("NaN"), HeaderValue::Text("NaN".to_string()));
        assert_eq!(HeaderValue::from_raw("1.2.3"), HeaderValue::Text("1.2.3".to_string()));
        assert_eq!(HeaderValue::from_raw(""), HeaderValue::Text(String::new()));
    }

    #[test]
    fn lines_without_colon_are_ignored() {
        let mut headers = HeaderMap::new();
        assert_eq!(headers.on_header_line("HTTP/1.1 200 OK\r\n"), 17);
        assert_eq!(headers.on_header_line("\r\n"), 2);
        assert_eq!(headers.on_header_line(": orphan value"), 14);
        assert!(headers.is_empty());
    }

    #[test]
    fn handler_reports_bytes_consumed() {
        let mut headers = HeaderMap::new();
        let line = "Server: nginx\r\n";
        assert_eq!(headers.on_header_line(line), line.len());
        assert_eq!(headers.get("server").and_then(HeaderValue::as_str), Some("nginx"));
    }

    #[test]
    fn later_header_overwrites_earlier_in_place() {
        let mut headers = HeaderMap::new();
        headers.on_header_line("Set-Cookie: a=1");
        headers.on_header_line("Server: nginx");
        headers.on_header_line("set-cookie: b=2");

        let names: Vec<&str> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Set-Cookie", "Server"]);
        assert_eq!(headers.get("Set-Cookie").and_then(HeaderValue::as_str), Some("b=2"));
    }

    #[test]
    fn json_values_keep_their_shape() {
        assert_eq!(HeaderValue::from_json(serde_json::json!(200)), HeaderValue::Integer(200));
        assert_eq!(
            HeaderValue::from_json(serde_json::json!("http://y.com")),
            HeaderValue::Text("http://y.com".to_string())
        );
        assert_eq!(HeaderValue::from_json(Value::Null), HeaderValue::Json(Value::Null));
        assert_eq!(HeaderValue::from_json(serde_json::json!(true)).to_string(), "true");
    }
}
