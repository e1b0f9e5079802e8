//! Error types for the scraping API client.
//!
//! # Design
//! Only construction can fail loudly. `ConfigError` is returned from
//! `ApiClient::new` and `ClientOptions::load`; everything that goes wrong
//! during a call is a `TransportError`, which the executor absorbs into an
//! absent response instead of handing it to the caller.

use thiserror::Error;

/// Errors raised while building a client or loading its options.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No token (or an empty one) was supplied.
    #[error("You need to specify the token")]
    MissingToken,

    /// A configuration source (file or environment) could not be read.
    #[error("failed to load client options: {0}")]
    Load(#[from] config::ConfigError),
}

/// Failures reported by a `Transport` while executing one call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The server answered with a non-2xx status.
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("host not found")]
    HostNotFound,

    /// Connection level failure (refused, reset, broken pipe...).
    #[error("I/O error: {0}")]
    Io(String),

    #[error("{0}")]
    Other(String),
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(status) => TransportError::Status(status),
            ureq::Error::Timeout(_) => TransportError::Timeout,
            ureq::Error::HostNotFound => TransportError::HostNotFound,
            ureq::Error::Io(e) => TransportError::Io(e.to_string()),
            other => TransportError::Other(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_message() {
        assert_eq!(ConfigError::MissingToken.to_string(), "You need to specify the token");
    }

    #[test]
    fn status_code_maps_to_status_variant() {
        let err: TransportError = ureq::Error::StatusCode(503).into();
        assert_eq!(err, TransportError::Status(503));
    }

    #[test]
    fn io_error_keeps_message() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: TransportError = ureq::Error::Io(io).into();
        assert!(matches!(err, TransportError::Io(ref msg) if msg.contains("refused")));
    }
}
