//! Error types for result stream consumption

use thiserror::Error;

/// Errors raised while consuming a result stream
///
/// None of these ever carry a partial result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Unknown message received: event '{name}' with data '{data}'")]
    UnknownEvent { name: String, data: String },

    #[error("0 events received from the query service")]
    NoEventsReceived,

    #[error("Stream ended before finish message received. Results may not be complete")]
    NoFinishMessage,

    #[error("Received {received}/{declared} events from the query service")]
    EventsMissed { received: u64, declared: u64 },

    #[error("Finish message declared no messageCount after {received} messages; completeness cannot be verified")]
    MissingMessageCount { received: u64 },

    #[error("Query failed: {payload}")]
    QueryError { payload: String },

    #[error("Malformed '{event}' payload: {reason}")]
    MalformedPayload { event: String, reason: String },

    #[error("Event stream is not valid UTF-8: {reason}")]
    InvalidUtf8 { reason: String },
}

impl ProtocolError {
    /// Whether retrying the same query might succeed
    ///
    /// Only a cut-off stream and a server-declared query error are plausibly
    /// transient; everything else is a protocol violation worth investigating.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProtocolError::NoFinishMessage | ProtocolError::QueryError { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
