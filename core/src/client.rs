//! Base client for the scraping API.
//!
//! # Design
//! `ApiClient` owns three steps of every call:
//! - the endpoint (`api_base_url + base_path + "?token=" + token`), rebuilt
//!   by `set_endpoint`;
//! - execution: per-call options become a `PreparedRequest` with the
//!   client's timeout, the optional customizer runs, and the `Transport`
//!   performs one blocking round-trip while headers stream into a
//!   `HeaderMap`;
//! - normalization: JSON bodies are unwrapped by `Response::normalize_json`.
//!
//! Per-call failures never surface as errors. A failed call leaves
//! `response()` empty and returns `None`, so endpoint wrappers built on top
//! can branch on presence alone. Only construction returns `Err`.

use std::fmt;
use std::time::Duration;

use tracing::{debug, warn};

use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::{ConfigError, TransportError};
use crate::headers::HeaderMap;
use crate::http::{CallOptions, PreparedRequest};
use crate::options::ClientOptions;
use crate::response::Response;
use crate::transport::{Transport, TransportResponse, UreqTransport};

/// Synchronous client for one endpoint of the scraping API.
///
/// Endpoint-specific clients wrap this type, pick a base path with
/// `set_endpoint` and forward their calls to `request`. Not meant to be
/// shared across threads: every call replaces the stored response.
pub struct ApiClient {
    /// Total and connect timeout for each call, in seconds.
    pub timeout_secs: u64,
    pub debug: bool,
    /// Like `debug`, and also asks the transport for wire-level logging.
    pub advanced_debug: bool,

    token: String,
    api_base_url: String,
    base_path: String,
    endpoint: String,
    response: Option<Response>,
    transport: Box<dyn Transport>,
    sink: Box<dyn DiagnosticSink>,
}

impl ApiClient {
    /// Build a client that talks to the network through `UreqTransport`.
    pub fn new(options: ClientOptions) -> Result<Self, ConfigError> {
        Self::with_transport(options, UreqTransport::new())
    }

    pub fn with_transport(options: ClientOptions, transport: impl Transport + 'static) -> Result<Self, ConfigError> {
        if options.token.is_empty() {
            return Err(ConfigError::MissingToken);
        }

        let mut client = Self {
            timeout_secs: options.timeout_secs,
            debug: options.debug,
            advanced_debug: options.advanced_debug,
            token: options.token,
            api_base_url: options.api_base_url,
            base_path: options.base_path,
            endpoint: String::new(),
            response: None,
            transport: Box::new(transport),
            sink: Box::new(TracingSink),
        };
        client.set_endpoint(None);
        Ok(client)
    }

    /// Replace the destination of debug dumps (defaults to `TracingSink`).
    pub fn set_diagnostic_sink(&mut self, sink: impl DiagnosticSink + 'static) {
        self.sink = Box::new(sink);
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// The response of the most recent call, if it succeeded.
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    /// Recompute the endpoint, switching to `new_base_path` when given.
    pub fn set_endpoint(&mut self, new_base_path: Option<&str>) {
        if let Some(path) = new_base_path {
            self.base_path = path.to_string();
        }
        self.endpoint = format!("{}{}?token={}", self.api_base_url, self.base_path, self.token);
    }

    pub(crate) fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Endpoint plus the call's query parameters.
    fn build_url(&self, options: &CallOptions<'_>) -> String {
        let endpoint = self.endpoint();
        let query = options.query_string();
        if query.is_empty() {
            endpoint.to_string()
        } else {
            format!("{endpoint}&{query}")
        }
    }

    fn diagnostics_enabled(&self) -> bool {
        self.debug || self.advanced_debug
    }

    /// Execute one call against the current endpoint.
    ///
    /// `data` is sent only for POST and PUT. Returns the stored response,
    /// or `None` when the transport failed or the status was not 2xx.
    pub fn request(&mut self, mut options: CallOptions<'_>, data: Option<&[u8]>) -> Option<&Response> {
        self.response = None;

        let method = options.http_method();
        let mut prepared = PreparedRequest::new(
            method,
            self.build_url(&options),
            data.map(<[u8]>::to_vec),
            Duration::from_secs(self.timeout_secs),
        )
        .with_verbose(self.advanced_debug);

        if let Some(mut customizer) = options.take_customizer() {
            customizer.customize(&mut prepared);
        }

        debug!(%method, base_path = %self.base_path, params = options.params().len(), "sending request");

        let mut headers = HeaderMap::new();
        let outcome = self
            .transport
            .execute(&prepared, &mut headers)
            .and_then(|reply| match reply.status {
                200..=299 => Ok(reply),
                status => Err(TransportError::Status(status)),
            });

        match outcome {
            Ok(TransportResponse { status, body, info }) => {
                let mut response = Response::new(status, body, headers);
                if response.has_json_content_type() || options.wants_json() {
                    response.normalize_json();
                }

                if self.diagnostics_enabled() {
                    self.sink.emit(&info.to_string());
                    self.sink.emit(&format!("Sent info:\n{}", payload_dump(prepared.body())));
                }
                self.response = Some(response);
            }
            Err(err) => {
                warn!(%method, base_path = %self.base_path, error = %err, "request failed");
                if self.diagnostics_enabled() {
                    self.sink.emit(&format!("transport error: {err}"));
                    self.sink.emit(&format!("Sent info:\n{}", payload_dump(prepared.body())));
                }
            }
        }

        self.response.as_ref()
    }
}

fn payload_dump(body: Option<&[u8]>) -> String {
    match body {
        Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        None => "(none)".to_string(),
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_base_url", &self.api_base_url)
            .field("base_path", &self.base_path)
            .field("timeout_secs", &self.timeout_secs)
            .field("debug", &self.debug)
            .field("advanced_debug", &self.advanced_debug)
            .field("response", &self.response)
            .finish_non_exhaustive()
    }
}
