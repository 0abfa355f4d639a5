//! GeoQuery Stream - Server-sent event decoding and result consumption
//!
//! The query service answers with a stream of named events. This crate parses
//! the event stream and folds it into one of three result shapes while checking
//! that the stream is complete:
//!
//! - a scalar count
//! - counts grouped by unique id
//! - the matching records, in arrival order

pub mod consumer;
pub mod error;
pub mod event;
pub mod parser;
pub mod progress;
pub mod record;

pub use consumer::{
    Accumulator, CountAccumulator, EventReader, GroupedCountAccumulator, QueryResult,
    RecordsAccumulator, ResultMode, StreamConsumer, StreamState,
};
pub use error::{ProtocolError, Result};
pub use event::StreamEvent;
pub use parser::{SseEvent, SseParser, DEFAULT_EVENT};
pub use progress::{NoProgress, Progress, ProgressObserver};
pub use record::Record;
