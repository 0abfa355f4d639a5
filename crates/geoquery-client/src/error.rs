//! Error types for the query client

use geoquery_core::{ConfigError, ValidationError};
use geoquery_stream::ProtocolError;
use thiserror::Error;

/// Errors raised by [`QueryClient`](crate::QueryClient) calls
#[derive(Debug, Error)]
pub enum ClientError {
    /// The query was rejected before any request was made
    #[error("Invalid query: {0}")]
    Validation(#[from] ValidationError),

    /// The result stream broke the protocol or reported a failure
    #[error("Result stream error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Connection, timeout or body read failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response
    #[error("HTTP error {status}: {body}")]
    Status { status: u16, body: String },

    /// A raw document declared a return shape this client cannot consume
    #[error("Unknown return type in query document: {found}")]
    UnknownReturnType { found: String },

    #[error("Failed to parse response: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Check if the caller may plausibly succeed by retrying the same call
    ///
    /// Transient errors include:
    /// - streams that ended before `finish` and server-declared query errors
    /// - connection failures, timeouts and body read failures
    ///
    /// Validation errors, protocol violations and HTTP error statuses are not retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Protocol(e) => e.is_transient(),
            ClientError::Http(e) => e.is_timeout() || e.is_connect() || e.is_body(),
            ClientError::Io(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(ClientError::from(ProtocolError::NoFinishMessage).is_retryable());
        assert!(ClientError::from(ProtocolError::QueryError {
            payload: "overloaded".to_string()
        })
        .is_retryable());
        assert!(ClientError::from(std::io::Error::other("reset")).is_retryable());

        assert!(!ClientError::from(ProtocolError::EventsMissed {
            received: 1,
            declared: 2
        })
        .is_retryable());
        assert!(!ClientError::from(ValidationError::BBoxUndefined).is_retryable());
        assert!(!ClientError::Status {
            status: 401,
            body: String::new()
        }
        .is_retryable());
    }
}
