use serde::Deserialize;

use crate::error::{ProtocolError, Result};
use crate::parser::SseEvent;

pub const KEEP_ALIVE: &str = "keepAlive";
pub const MESSAGE: &str = "message";
pub const FINISH: &str = "finish";
pub const QUERY_ERROR: &str = "queryError";

/// An event of the query result protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Liveness signal, carries nothing
    KeepAlive,
    /// One batch of results; the payload shape depends on the result mode
    Message(String),
    /// End of results with the number of messages the server sent
    Finish { message_count: Option<u64> },
    /// Server-side failure, payload kept verbatim
    QueryError(String),
    /// Any other event name
    Unknown { name: String, data: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinishPayload {
    message_count: Option<u64>,
}

impl StreamEvent {
    /// Classify a raw SSE event
    pub fn from_sse(event: SseEvent) -> Result<Self> {
        match event.event.as_str() {
            KEEP_ALIVE => Ok(StreamEvent::KeepAlive),
            MESSAGE => Ok(StreamEvent::Message(event.data)),
            FINISH => {
                // Older servers may send an empty finish body
                if event.data.trim().is_empty() {
                    return Ok(StreamEvent::Finish { message_count: None });
                }
                let payload: FinishPayload =
                    serde_json::from_str(&event.data).map_err(|e| ProtocolError::MalformedPayload {
                        event: FINISH.to_string(),
                        reason: e.to_string(),
                    })?;
                Ok(StreamEvent::Finish {
                    message_count: payload.message_count,
                })
            }
            QUERY_ERROR => Ok(StreamEvent::QueryError(event.data)),
            _ => Ok(StreamEvent::Unknown {
                name: event.event,
                data: event.data,
            }),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            StreamEvent::KeepAlive => KEEP_ALIVE,
            StreamEvent::Message(_) => MESSAGE,
            StreamEvent::Finish { .. } => FINISH,
            StreamEvent::QueryError(_) => QUERY_ERROR,
            StreamEvent::Unknown { name, .. } => name,
        }
    }
}
