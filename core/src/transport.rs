//! Pluggable HTTP transport.
//!
//! # Design
//! The client never talks to the network directly. A `Transport` executes
//! one `PreparedRequest`, streams the response header lines through a
//! `HeaderHandler` as they are read, and returns status, body and a
//! `TransportInfo` snapshot for debug dumps.
//!
//! `UreqTransport` is the default. It builds a fresh agent for every call so
//! connection state never outlives `execute`, on success or failure. Bodies
//! are read without a size cap. ureq decodes `gzip` itself; `deflate` bodies
//! come through untouched and are inflated here.

use std::cell::RefCell;
use std::fmt;
use std::io::Read;
use std::rc::Rc;
use std::time::{Duration, Instant};

use flate2::read::{DeflateDecoder, ZlibDecoder};
use tracing::trace;
use ureq::RequestBuilder;

use crate::error::TransportError;
use crate::headers::HeaderHandler;
use crate::http::{HttpMethod, PreparedRequest};

/// Executes a single prepared request, blocking until it completes.
pub trait Transport {
    fn execute(
        &mut self,
        request: &PreparedRequest,
        headers: &mut dyn HeaderHandler,
    ) -> Result<TransportResponse, TransportError>;
}

/// Raw outcome of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub info: TransportInfo,
}

/// Transfer details dumped to the diagnostic sink in debug mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportInfo {
    pub url: String,
    pub method: String,
    pub http_code: u16,
    pub total_time: Duration,
    pub request_headers: Vec<(String, String)>,
    pub size_download: usize,
}

impl fmt::Display for TransportInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "url: {}", self.url)?;
        writeln!(f, "method: {}", self.method)?;
        writeln!(f, "http_code: {}", self.http_code)?;
        writeln!(f, "total_time: {:.3?}", self.total_time)?;
        writeln!(f, "size_download: {}", self.size_download)?;
        write!(f, "request_header:")?;
        for (name, value) in &self.request_headers {
            write!(f, "\n  {name}: {value}")?;
        }
        Ok(())
    }
}

/// Blocking transport backed by `ureq`.
///
/// TLS goes through ureq's rustls defaults, which always verify the
/// certificate chain and hostname. Redirects are not followed and status
/// codes come back as data; rejecting non-2xx is the client's job.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl UreqTransport {
    pub fn new() -> Self {
        Self
    }

    fn agent(request: &PreparedRequest) -> ureq::Agent {
        ureq::Agent::config_builder()
            .timeout_global(Some(request.timeout()))
            .timeout_connect(Some(request.connect_timeout()))
            .http_status_as_error(false)
            .max_redirects(0)
            .build()
            .new_agent()
    }
}

/// Headers as they go on the wire: the client's `Accept-Encoding`, unless
/// the customizer set its own, followed by the custom headers.
fn wire_headers(request: &PreparedRequest) -> Vec<(String, String)> {
    let custom_encoding = request
        .headers()
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case("accept-encoding"));

    let mut headers = Vec::with_capacity(request.headers().len() + 1);
    if !custom_encoding {
        headers.push(("Accept-Encoding".to_string(), request.accept_encoding().to_string()));
    }
    headers.extend(request.headers().iter().cloned());
    headers
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

/// Inflate a `deflate` body. Most servers send a zlib stream, some send raw
/// deflate.
fn inflate(raw: &[u8]) -> Result<Vec<u8>, TransportError> {
    let mut body = Vec::new();
    if ZlibDecoder::new(raw).read_to_end(&mut body).is_ok() {
        return Ok(body);
    }
    body.clear();
    DeflateDecoder::new(raw)
        .read_to_end(&mut body)
        .map_err(|err| TransportError::Io(format!("deflate: {err}")))?;
    Ok(body)
}

impl Transport for UreqTransport {
    fn execute(
        &mut self,
        request: &PreparedRequest,
        headers: &mut dyn HeaderHandler,
    ) -> Result<TransportResponse, TransportError> {
        let agent = Self::agent(request);
        let url = request.url();
        let request_headers = wire_headers(request);
        let started = Instant::now();

        if request.verbose() {
            trace!(method = %request.method(), url, "> request line");
            for (name, value) in &request_headers {
                trace!("> {name}: {value}");
            }
        }

        let body = request.body().unwrap_or_default();
        let result = match request.method() {
            HttpMethod::Get => with_headers(agent.get(url), &request_headers).call(),
            HttpMethod::Delete => with_headers(agent.delete(url), &request_headers).call(),
            HttpMethod::Post => with_headers(agent.post(url), &request_headers).send(body),
            HttpMethod::Put => with_headers(agent.put(url), &request_headers).send(body),
        };
        let mut response = result?;

        let status = response.status().as_u16();
        let deflated = response
            .headers()
            .get("content-encoding")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|coding| coding.trim().eq_ignore_ascii_case("deflate"));

        // ureq drops these for gzip bodies it decodes; same for deflate.
        let stale = |name: &str| deflated && (name == "content-encoding" || name == "content-length");

        let status_line = format!("{:?} {}\r\n", response.version(), response.status());
        headers.on_header_line(&status_line);
        for (name, value) in response.headers() {
            if stale(name.as_str()) {
                continue;
            }
            let line = format!("{}: {}\r\n", name.as_str(), String::from_utf8_lossy(value.as_bytes()));
            if request.verbose() {
                trace!("< {}", line.trim_end());
            }
            headers.on_header_line(&line);
        }
        headers.on_header_line("\r\n");

        let raw = response.body_mut().with_config().limit(u64::MAX).read_to_vec()?;
        let body = if deflated { inflate(&raw)? } else { raw };

        Ok(TransportResponse {
            status,
            info: TransportInfo {
                url: url.to_string(),
                method: request.method().to_string(),
                http_code: status,
                total_time: started.elapsed(),
                request_headers,
                size_download: body.len(),
            },
            body,
        })
    }
}

/// Transport that replays one canned reply and records what was sent.
///
/// Clones share the record, so a test can keep a handle after moving the
/// transport into a client.
#[derive(Debug, Clone)]
pub struct CannedTransport {
    status: u16,
    header_lines: Vec<String>,
    body: Vec<u8>,
    error: Option<TransportError>,
    sent: Rc<RefCell<Vec<PreparedRequest>>>,
}

impl CannedTransport {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            header_lines: Vec::new(),
            body: body.into(),
            error: None,
            sent: Rc::default(),
        }
    }

    /// A transport whose every call fails with `error`.
    pub fn failing(error: TransportError) -> Self {
        Self {
            error: Some(error),
            ..Self::new(0, Vec::new())
        }
    }

    /// Add a raw header line (`Name: value`) to the reply.
    pub fn header_line(mut self, line: impl Into<String>) -> Self {
        self.header_lines.push(line.into());
        self
    }

    /// Requests executed so far, oldest first.
    pub fn sent(&self) -> Vec<PreparedRequest> {
        self.sent.borrow().clone()
    }
}

impl Transport for CannedTransport {
    fn execute(
        &mut self,
        request: &PreparedRequest,
        headers: &mut dyn HeaderHandler,
    ) -> Result<TransportResponse, TransportError> {
        self.sent.borrow_mut().push(request.clone());
        if let Some(err) = &self.error {
            return Err(err.clone());
        }

        for line in &self.header_lines {
            headers.on_header_line(line);
        }

        Ok(TransportResponse {
            status: self.status,
            body: self.body.clone(),
            info: TransportInfo {
                url: request.url().to_string(),
                method: request.method().to_string(),
                http_code: self.status,
                total_time: Duration::ZERO,
                request_headers: request.headers().to_vec(),
                size_download: self.body.len(),
            },
        })
    }
}
