//! GeoQuery Core - Query value objects, document builder, and configuration
//!
//! This crate contains the validated building blocks of a spatio-temporal query
//! and the [`QueryDocument`](models::QueryDocument) that assembles them into the
//! canonical JSON document submitted to the query service.

pub mod config;
pub mod error;
pub mod models;

pub use error::{ConfigError, Result, ValidationError};
pub use models::*;
