//! Result-stream consumer
//!
//! A small state machine over decoded events:
//!
//! ```text
//! AwaitingFirstEvent --message--> Accumulating --finish--> Finished
//!          |                           |
//!          +---queryError / unknown----+--> Aborted
//! ```
//!
//! The accumulated result is only handed out once `finish` arrived and its
//! declared message count matches the number of messages folded.

use std::collections::{HashMap, VecDeque};
use std::io::{ErrorKind, Read};

use geoquery_core::UniqueId;
use serde::Deserialize;

use crate::error::{ProtocolError, Result};
use crate::event::{StreamEvent, MESSAGE};
use crate::parser::{SseEvent, SseParser};
use crate::progress::{with_thousands, Progress, ProgressObserver};
use crate::record::Record;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Position of a consumption run in the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    AwaitingFirstEvent,
    Accumulating,
    Finished,
    Aborted,
}

/// Folds `message` payloads into one result shape
pub trait Accumulator {
    type Output;

    fn fold(&mut self, data: &str) -> Result<()>;

    /// Progress summary of what has been folded so far
    fn describe(&self) -> String;

    fn into_output(self) -> Self::Output;
}

/// Sum of scalar counts
#[derive(Debug, Default)]
pub struct CountAccumulator {
    total: u64,
}

impl Accumulator for CountAccumulator {
    type Output = u64;

    fn fold(&mut self, data: &str) -> Result<()> {
        let count: u64 = parse_payload(data)?;
        self.total = self
            .total
            .checked_add(count)
            .ok_or_else(|| ProtocolError::MalformedPayload {
                event: MESSAGE.to_string(),
                reason: format!("count overflow adding {} to {}", count, self.total),
            })?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("Collecting {} counts", with_thousands(self.total))
    }

    fn into_output(self) -> u64 {
        self.total
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GroupedPayload {
    Pairs(Vec<(UniqueId, u64)>),
    Object(HashMap<String, u64>),
}

/// Counts per unique id; a later count for the same id replaces the earlier one
#[derive(Debug, Default)]
pub struct GroupedCountAccumulator {
    counts: HashMap<UniqueId, u64>,
}

impl Accumulator for GroupedCountAccumulator {
    type Output = HashMap<UniqueId, u64>;

    fn fold(&mut self, data: &str) -> Result<()> {
        match parse_payload(data)? {
            GroupedPayload::Pairs(pairs) => self.counts.extend(pairs),
            GroupedPayload::Object(object) => self
                .counts
                .extend(object.into_iter().map(|(id, count)| (object_key(id), count))),
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("Collecting {} unique ids", with_thousands(self.counts.len() as u64))
    }

    fn into_output(self) -> Self::Output {
        self.counts
    }
}

/// Records concatenated in arrival order
#[derive(Debug, Default)]
pub struct RecordsAccumulator {
    records: Vec<Record>,
}

impl Accumulator for RecordsAccumulator {
    type Output = Vec<Record>;

    fn fold(&mut self, data: &str) -> Result<()> {
        let batch: Vec<Record> = parse_payload(data)?;
        self.records.extend(batch);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("Collecting {} records", with_thousands(self.records.len() as u64))
    }

    fn into_output(self) -> Self::Output {
        self.records
    }
}

/// JSON object keys are always strings; integer-looking keys name integer ids
fn object_key(key: String) -> UniqueId {
    match key.parse::<i64>() {
        Ok(id) => UniqueId::Int(id),
        Err(_) => UniqueId::Str(key),
    }
}

fn parse_payload<T: for<'de> Deserialize<'de>>(data: &str) -> Result<T> {
    serde_json::from_str(data).map_err(|e| ProtocolError::MalformedPayload {
        event: MESSAGE.to_string(),
        reason: e.to_string(),
    })
}

/// Which result shape a query produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultMode {
    Count,
    GroupedCount,
    Records,
}

/// A complete, integrity-checked result
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Count(u64),
    GroupedCount(HashMap<UniqueId, u64>),
    Records(Vec<Record>),
}

/// Blocking iterator over the SSE events of a byte source
///
/// A read error ends the iteration the same way a closed connection does;
/// the consumer then reports the stream as incomplete.
pub struct EventReader<R> {
    source: R,
    parser: SseParser,
    pending: VecDeque<SseEvent>,
    exhausted: bool,
}

impl<R: Read> EventReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            parser: SseParser::new(),
            pending: VecDeque::new(),
            exhausted: false,
        }
    }
}

impl<R: Read> Iterator for EventReader<R> {
    type Item = Result<SseEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            if self.exhausted {
                return None;
            }

            match self.source.read(&mut chunk) {
                Ok(0) => {
                    if self.parser.has_pending() {
                        tracing::debug!("Discarding incomplete trailing event");
                    }
                    self.exhausted = true;
                }
                Ok(n) => match self.parser.feed(&chunk[..n]) {
                    Ok(events) => self.pending.extend(events),
                    Err(e) => {
                        self.exhausted = true;
                        return Some(Err(e));
                    }
                },
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Event stream read failed, treating as end of stream");
                    self.exhausted = true;
                }
            }
        }
    }
}

/// One run of the result protocol
pub struct StreamConsumer<'a, A> {
    accumulator: A,
    observer: &'a mut dyn ProgressObserver,
    state: StreamState,
    events_seen: u64,
    messages_received: u64,
    declared: Option<u64>,
}

impl<'a, A: Accumulator> StreamConsumer<'a, A> {
    pub fn new(accumulator: A, observer: &'a mut dyn ProgressObserver) -> Self {
        Self {
            accumulator,
            observer,
            state: StreamState::AwaitingFirstEvent,
            events_seen: 0,
            messages_received: 0,
            declared: None,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn messages_received(&self) -> u64 {
        self.messages_received
    }

    /// Apply one event; returns `true` once the stream reached a terminal state
    pub fn handle(&mut self, event: StreamEvent) -> Result<bool> {
        self.events_seen += 1;
        tracing::trace!(event = event.name(), state = ?self.state, "Stream event");

        match event {
            StreamEvent::KeepAlive => Ok(false),
            StreamEvent::Message(data) => {
                if let Err(e) = self.accumulator.fold(&data) {
                    return Err(self.abort(e));
                }
                self.messages_received += 1;
                self.state = StreamState::Accumulating;
                self.observer.on_message(&self.progress());
                Ok(false)
            }
            StreamEvent::Finish { message_count } => {
                self.declared = message_count;
                self.state = StreamState::Finished;
                Ok(true)
            }
            StreamEvent::QueryError(payload) => {
                tracing::debug!(payload = %payload, "Query error received");
                Err(self.abort(ProtocolError::QueryError { payload }))
            }
            StreamEvent::Unknown { name, data } => {
                Err(self.abort(ProtocolError::UnknownEvent { name, data }))
            }
        }
    }

    /// Consume events until `finish`, an error, or exhaustion, then check integrity
    pub fn run<I>(mut self, events: I) -> Result<A::Output>
    where
        I: IntoIterator<Item = Result<SseEvent>>,
    {
        for event in events {
            let event = event
                .and_then(StreamEvent::from_sse)
                .map_err(|e| self.abort(e))?;
            if self.handle(event)? {
                break;
            }
        }

        self.finish()
    }

    /// Post-stream checks; only a verified stream yields the accumulator
    pub fn finish(mut self) -> Result<A::Output> {
        let outcome = self.verify();
        let progress = self.progress();
        self.observer.on_complete(&progress, outcome.is_ok());

        outcome?;
        tracing::debug!(messages = self.messages_received, "Stream finished");
        Ok(self.accumulator.into_output())
    }

    fn verify(&mut self) -> Result<()> {
        if self.events_seen == 0 {
            self.state = StreamState::Aborted;
            return Err(ProtocolError::NoEventsReceived);
        }

        if self.state != StreamState::Finished {
            self.state = StreamState::Aborted;
            return Err(ProtocolError::NoFinishMessage);
        }

        match self.declared {
            None => {
                self.state = StreamState::Aborted;
                Err(ProtocolError::MissingMessageCount {
                    received: self.messages_received,
                })
            }
            Some(declared) if declared != self.messages_received => {
                self.state = StreamState::Aborted;
                Err(ProtocolError::EventsMissed {
                    received: self.messages_received,
                    declared,
                })
            }
            Some(_) => Ok(()),
        }
    }

    fn abort(&mut self, error: ProtocolError) -> ProtocolError {
        self.state = StreamState::Aborted;
        let progress = self.progress();
        self.observer.on_complete(&progress, false);
        error
    }

    fn progress(&self) -> Progress {
        Progress {
            messages_received: self.messages_received,
            description: self.accumulator.describe(),
        }
    }
}

impl ResultMode {
    /// Consume `source` with the accumulator matching this mode
    pub fn consume<R: Read>(self, source: R, observer: &mut dyn ProgressObserver) -> Result<QueryResult> {
        let events = EventReader::new(source);
        match self {
            ResultMode::Count => StreamConsumer::new(CountAccumulator::default(), observer)
                .run(events)
                .map(QueryResult::Count),
            ResultMode::GroupedCount => StreamConsumer::new(GroupedCountAccumulator::default(), observer)
                .run(events)
                .map(QueryResult::GroupedCount),
            ResultMode::Records => StreamConsumer::new(RecordsAccumulator::default(), observer)
                .run(events)
                .map(QueryResult::Records),
        }
    }
}
