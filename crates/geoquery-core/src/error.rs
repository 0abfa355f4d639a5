//! Error types for geoquery

use thiserror::Error;

/// Errors raised while constructing value objects or assembling a query document.
///
/// Every variant names exactly one violated rule so callers can match on which
/// check failed rather than on message text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    // Point errors
    #[error("Longitude value '{value}' not within (-180.0, 180.0)")]
    LongitudeOutOfBounds { value: f64 },

    #[error("Latitude value '{value}' not within (-90.0, 90.0)")]
    LatitudeOutOfBounds { value: f64 },

    // Bounding box errors
    #[error("BoundingBox is undefined")]
    BBoxUndefined,

    #[error("BoundingBox is defined from 4 values, {found} given")]
    BBoxLength { found: usize },

    #[error("min_lon ({min_lon}) is >= max_lon ({max_lon})")]
    BBoxLongitudeMismatch { min_lon: f64, max_lon: f64 },

    #[error("min_lat ({min_lat}) is >= max_lat ({max_lat})")]
    BBoxLatitudeMismatch { min_lat: f64, max_lat: f64 },

    // Polygon errors
    #[error("Polygon is undefined")]
    PolygonUndefined,

    #[error("Polygons should be linear rings with four or more points - only {found} found")]
    LinearRing { found: usize },

    #[error("Polygons should be a linear ring - first point {first:?} and last point {last:?} are not identical")]
    PolygonNotClosed { first: (f64, f64), last: (f64, f64) },

    #[error("GeoJSON is not a Polygon, found {found}")]
    GeoJsonNotPolygon { found: String },

    #[error("GeoJSON could not be parsed: {reason}")]
    InvalidGeoJson { reason: String },

    // Time range errors
    #[error("TimeRange is undefined")]
    TimeRangeUndefined,

    #[error("min_time ({min_time}) is after max_time ({max_time})")]
    TimeRangeMismatch { min_time: String, max_time: String },

    #[error("{bound} has no timezone")]
    TimeZoneUndefined { bound: &'static str },

    #[error("'{value}' is not a valid ISO 8601 timestamp: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    // Filter field errors
    #[error("'{operator}' is not a valid operation for the {kind} Filter Field '{name}': {reason}")]
    FilterFieldOperationValue {
        name: String,
        kind: String,
        operator: String,
        reason: String,
    },

    #[error("'{name}' is not a field registered to the dataset schema")]
    FilterFieldNameNotInSchema { name: String },

    #[error("'{kind}' does not match type in schema for '{name}' ({schema_type})")]
    FilterFieldType {
        name: String,
        kind: String,
        schema_type: String,
    },

    #[error("Schema indicates field '{name}' has nullable={schema_nullable}, found {nullable}")]
    FilterFieldInvalidNullability {
        name: String,
        nullable: bool,
        schema_nullable: bool,
    },

    #[error("'{value}' is not a valid value for Filter Field '{name}': {reason}")]
    FilterFieldValue {
        name: String,
        value: String,
        reason: String,
    },

    #[error("'{0}' is not a valid field kind")]
    UnknownFieldKind(String),

    #[error("'{0}' is not a valid filter operator")]
    UnknownOperator(String),

    #[error("'{0}' is not a valid Only filter")]
    UnknownOnly(String),

    // Return model errors
    #[error("'{0}' is not a valid GroupBy")]
    UnknownGroupBy(String),

    #[error("'{0}' is not a valid IncludeField")]
    UnknownIncludeField(String),

    #[error("Records include list must not be empty")]
    EmptyInclude,

    // Document errors
    #[error("Invalid query document: {reason}")]
    InvalidQueryDocument { reason: String },
}

/// Errors raised while loading layered configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ValidationError>;
