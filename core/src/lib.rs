//! Synchronous base client for the ProxyCrawl scraping API.
//!
//! # Overview
//! `ApiClient` builds the authenticated endpoint URL, executes one blocking
//! HTTP call per `request` through a pluggable `Transport`, and normalizes
//! the result into a `Response`: headers captured line by line, JSON
//! envelopes unwrapped so `json` always holds the payload.
//!
//! # Design
//! - Endpoint-specific clients (crawling, scraping, leads, screenshots...)
//!   are thin wrappers that choose a base path and forward to `request`.
//! - Construction is the only fallible step. Per-call failures leave the
//!   client without a response instead of returning an error.
//! - The network sits behind `Transport`; `UreqTransport` is the default
//!   and `CannedTransport` replays fixed replies for tests.
//! - Debug dumps go to a `DiagnosticSink`, never into the response.

pub mod client;
pub mod diagnostics;
pub mod error;
pub mod headers;
pub mod http;
pub mod options;
pub mod response;
pub mod transport;

pub use client::ApiClient;
pub use diagnostics::{DiagnosticSink, MemorySink, TracingSink};
pub use error::{ConfigError, TransportError};
pub use headers::{HeaderHandler, HeaderMap, HeaderValue};
pub use http::{CallOptions, HttpMethod, PreparedRequest, RequestCustomizer};
pub use options::{ClientOptions, PUBLIC_API_URL};
pub use response::{Response, JSON_CONTENT_TYPE};
pub use transport::{CannedTransport, Transport, TransportInfo, TransportResponse, UreqTransport};
