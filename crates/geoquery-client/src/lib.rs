//! GeoQuery Client - Submit query documents and consume their results
//!
//! [`QueryClient`] binds a validated [`QueryDocument`](geoquery_core::QueryDocument)
//! to one request on a [`Transport`] and feeds the streamed response through the
//! integrity-checked consumer from `geoquery-stream`.

pub mod client;
pub mod error;
pub mod management;
pub mod transport;

pub use client::{raw_result_mode, result_mode_of, QueryClient, INSTRUMENTATION_PATH, MANAGE_PATH, QUERY_PATH};
pub use error::{ClientError, Result};
pub use management::{InstrumentationFilter, ManageOperation, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use transport::{HttpTransport, Transport};
