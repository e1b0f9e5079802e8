//! Request description types.
//!
//! # Design
//! `CallOptions` is what a caller passes to `ApiClient::request`: query
//! parameters in insertion order, the HTTP verb, and an optional
//! `RequestCustomizer`. The executor turns it into a `PreparedRequest`, the
//! transport configuration for exactly one call, and hands that to the
//! customizer before the transport runs.
//!
//! `PreparedRequest` exposes headers for mutation and nothing else. There is
//! no TLS switch to flip: certificate and hostname verification belong to
//! the transport and are always on.

use std::fmt;
use std::time::Duration;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Parse a verb name. Anything unrecognised falls back to GET.
    pub fn parse(name: &str) -> Self {
        match name {
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            _ => HttpMethod::Get,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether request data is attached for this verb.
    pub fn sends_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hook invoked with the in-flight request right before it is sent.
pub trait RequestCustomizer {
    fn customize(&mut self, request: &mut PreparedRequest);
}

impl<F> RequestCustomizer for F
where
    F: FnMut(&mut PreparedRequest),
{
    fn customize(&mut self, request: &mut PreparedRequest) {
        (self)(request)
    }
}

/// Per-call options: query parameters, verb and pre-send hook.
#[derive(Default)]
pub struct CallOptions<'a> {
    params: Vec<(String, String)>,
    method: HttpMethod,
    customizer: Option<Box<dyn RequestCustomizer + 'a>>,
}

impl<'a> CallOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build options from key/value pairs. A `method` pair selects the verb.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .fold(Self::new(), |options, (k, v)| options.param(k, v))
    }

    /// Add a query parameter. The reserved `method` key sets the verb
    /// instead and is never sent as a parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        if key == "method" {
            self.method = HttpMethod::parse(&value);
            return self;
        }
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.params.push((key, value)),
        }
        self
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Shorthand for `param("format", format)`.
    pub fn format(self, format: impl Into<String>) -> Self {
        self.param("format", format)
    }

    pub fn customizer(mut self, customizer: impl RequestCustomizer + 'a) -> Self {
        self.customizer = Some(Box::new(customizer));
        self
    }

    pub fn http_method(&self) -> HttpMethod {
        self.method
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the caller asked for `format=json`.
    pub fn wants_json(&self) -> bool {
        self.get("format") == Some("json")
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Form-encode the query parameters (`a=1&b=two+words`).
    pub fn query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish()
    }

    pub(crate) fn take_customizer(&mut self) -> Option<Box<dyn RequestCustomizer + 'a>> {
        self.customizer.take()
    }
}

impl fmt::Debug for CallOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallOptions")
            .field("params", &self.params)
            .field("method", &self.method)
            .field("customizer", &self.customizer.is_some())
            .finish()
    }
}

/// Transport configuration for a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    method: HttpMethod,
    url: String,
    body: Option<Vec<u8>>,
    headers: Vec<(String, String)>,
    timeout: Duration,
    connect_timeout: Duration,
    accept_encoding: &'static str,
    verbose: bool,
}

impl PreparedRequest {
    /// Content codings requested from the server.
    pub const ACCEPT_ENCODING: &'static str = "gzip, deflate";

    pub(crate) fn new(method: HttpMethod, url: String, body: Option<Vec<u8>>, timeout: Duration) -> Self {
        Self {
            method,
            url,
            body: body.filter(|_| method.sends_body()),
            headers: Vec::new(),
            timeout,
            connect_timeout: timeout,
            accept_encoding: Self::ACCEPT_ENCODING,
            verbose: false,
        }
    }

    pub(crate) fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Set a request header, replacing any earlier value for the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name, value)),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn accept_encoding(&self) -> &'static str {
        self.accept_encoding
    }

    /// Whether the transport should log wire-level detail.
    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_key_is_not_a_query_param() {
        let options = CallOptions::from_pairs([("url", "http://x.com"), ("method", "GET")]);
        assert_eq!(options.http_method(), HttpMethod::Get);
        assert_eq!(options.query_string(), "url=http%3A%2F%2Fx.com");
    }

    #[test]
    fn method_param_selects_verb() {
        let options = CallOptions::new().param("method", "DELETE");
        assert_eq!(options.http_method(), HttpMethod::Delete);
        assert!(options.params().is_empty());
    }

    #[test]
    fn unknown_method_falls_back_to_get() {
        assert_eq!(HttpMethod::parse("PATCH"), HttpMethod::Get);
        assert_eq!(HttpMethod::parse("post"), HttpMethod::Get);
    }

    #[test]
    fn format_is_sent_and_detected() {
        let options = CallOptions::new().param("url", "a b").format("json");
        assert!(options.wants_json());
        assert_eq!(options.query_string(), "url=a+b&format=json");
    }

    #[test]
    fn repeated_param_keeps_first_position() {
        let options = CallOptions::new()
            .param("a", "1")
            .param("b", "2")
            .param("a", "3");
        assert_eq!(options.query_string(), "a=3&b=2");
    }

    #[test]
    fn body_is_dropped_for_get_and_delete() {
        let timeout = Duration::from_secs(5);
        let get = PreparedRequest::new(HttpMethod::Get, "u".into(), Some(b"x".to_vec()), timeout);
        let delete = PreparedRequest::new(HttpMethod::Delete, "u".into(), Some(b"x".to_vec()), timeout);
        let put = PreparedRequest::new(HttpMethod::Put, "u".into(), Some(b"x".to_vec()), timeout);
        assert!(get.body().is_none());
        assert!(delete.body().is_none());
        assert_eq!(put.body(), Some(&b"x"[..]));
    }

    #[test]
    fn both_timeouts_follow_client_timeout() {
        let req = PreparedRequest::new(HttpMethod::Get, "u".into(), None, Duration::from_secs(120));
        assert_eq!(req.timeout(), Duration::from_secs(120));
        assert_eq!(req.connect_timeout(), Duration::from_secs(120));
        assert_eq!(req.accept_encoding(), "gzip, deflate");
        assert!(!req.verbose());
    }

    #[test]
    fn closure_customizer_sets_headers() {
        let mut options = CallOptions::new().customizer(|req: &mut PreparedRequest| {
            req.set_header("X-Trace", "1");
            req.set_header("x-trace", "2");
        });
        let mut req = PreparedRequest::new(HttpMethod::Get, "u".into(), None, Duration::from_secs(1));
        options.take_customizer().unwrap().customize(&mut req);
        assert_eq!(req.headers(), &[("X-Trace".to_string(), "2".to_string())]);
    }
}
