//! SSE event stream parser
//!
//! Parses the Server-Sent Events protocol format:
//! - `event:` lines name the event; without one the event is a `message`
//! - `data:` lines contain the payload (may span multiple lines)
//! - `id:` lines contain the event ID
//! - Empty lines delimit events
//! - Lines starting with `:` are comments

use crate::error::{ProtocolError, Result};

/// Event name used when an event has no `event:` line
pub const DEFAULT_EVENT: &str = "message";

/// A parsed SSE event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event name (from `event:` field, `message` when absent)
    pub event: String,
    /// Event data (from `data:` field(s), joined with newlines)
    pub data: String,
    /// Event ID (from `id:` field)
    pub id: Option<String>,
}

impl SseEvent {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
            id: None,
        }
    }
}

/// Streaming SSE parser that accumulates bytes and yields complete events
///
/// Bytes are buffered until a full line is available, so multi-byte characters
/// split across chunks decode correctly.
#[derive(Debug, Default)]
pub struct SseParser {
    /// Bytes of the current incomplete line
    buffer: Vec<u8>,
    current_event: Option<String>,
    current_data: Vec<String>,
    current_id: Option<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes into the parser and return any complete events
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<SseEvent>> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();

        while let Some(newline_pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            let line = std::str::from_utf8(&raw[..newline_pos]).map_err(|e| {
                tracing::warn!("Received invalid UTF-8 in SSE stream");
                ProtocolError::InvalidUtf8 {
                    reason: e.to_string(),
                }
            })?;

            // CRLF line endings
            let line = line.trim_end_matches('\r');

            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }

        Ok(events)
    }

    /// Whether a partial line or event is buffered
    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty() || !self.current_data.is_empty() || self.current_event.is_some()
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            // Empty line = end of event
            if self.current_data.is_empty() && self.current_event.is_none() {
                return None;
            }
            let event = SseEvent {
                event: self
                    .current_event
                    .take()
                    .unwrap_or_else(|| DEFAULT_EVENT.to_string()),
                data: self.current_data.join("\n"),
                id: self.current_id.take(),
            };
            self.current_data.clear();
            return Some(event);
        }

        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.current_event = Some(value.trim().to_string()),
            "data" => self.current_data.push(value.to_string()),
            "id" => self.current_id = Some(value.trim().to_string()),
            // `retry` and unknown fields carry nothing for us
            _ => {}
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_event() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"event: finish\ndata: {\"messageCount\": 0}\n\n").unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "finish");
        assert_eq!(events[0].data, r#"{"messageCount": 0}"#);
    }

    #[test]
    fn test_parse_default_event_name() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"data: 12\n\n").unwrap();

        assert_eq!(events, vec![SseEvent::new(DEFAULT_EVENT, "12")]);
    }

    #[test]
    fn test_parse_multiline_data() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"event: message\ndata: [1,\ndata: 2]\n\n").unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "[1,\n2]");
    }

    #[test]
    fn test_parse_with_id() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"id: 123\nevent: message\ndata: 1\n\n").unwrap();

        assert_eq!(events[0].id, Some("123".to_string()));
    }

    #[test]
    fn test_parse_comment_ignored() {
        let mut parser = SseParser::new();
        let events = parser.feed(b": ping\n\n: another\nevent: keepAlive\ndata:\n\n").unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "keepAlive");
        assert_eq!(events[0].data, "");
    }

    #[test]
    fn test_parse_chunked_input() {
        let mut parser = SseParser::new();

        let events = parser.feed(b"event: message\nda").unwrap();
        assert!(events.is_empty());
        assert!(parser.has_pending());

        let events = parser.feed(b"ta: 4\n\n").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "4");
        assert!(!parser.has_pending());
    }

    #[test]
    fn test_parse_split_multibyte_character() {
        let mut parser = SseParser::new();
        let bytes = "data: \"café\"\n\n".as_bytes();
        let split = bytes.iter().position(|b| *b == 0xC3).unwrap() + 1;

        assert!(parser.feed(&bytes[..split]).unwrap().is_empty());
        let events = parser.feed(&bytes[split..]).unwrap();
        assert_eq!(events[0].data, "\"café\"");
    }

    #[test]
    fn test_parse_invalid_utf8() {
        let mut parser = SseParser::new();
        let result = parser.feed(b"data: \xff\xfe\n\n");
        assert!(matches!(result, Err(ProtocolError::InvalidUtf8 { .. })));
    }

    #[test]
    fn test_parse_crlf_line_endings() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"event: message\r\ndata: 1\r\n\r\n").unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "message");
        assert_eq!(events[0].data, "1");
    }

    #[test]
    fn test_parse_data_without_space() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"data:no-space\n\n").unwrap();

        assert_eq!(events[0].data, "no-space");
    }
}
