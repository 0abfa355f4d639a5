pub mod filter;
pub mod geometry;
pub mod query;
pub mod returns;
pub mod schema;
pub mod time_range;
pub mod uid;

pub use filter::{FieldKind, FieldValue, FilterField, FilterOperator, Only};
pub use geometry::{BoundingBox, CoordinateOrder, Geometry, Point, Polygon};
pub use query::{QueryDocument, QueryFilters};
pub use returns::{Count, GroupBy, IncludeField, Records, ReturnModel};
pub use schema::{DatasetSchema, SchemaField, SchemaFieldType};
pub use time_range::{Instant, TimeRange};
pub use uid::UniqueId;
