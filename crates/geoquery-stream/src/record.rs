use chrono::{DateTime, Utc};
use geoquery_core::UniqueId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of a records result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: UniqueId,

    /// `[longitude, latitude]`
    pub coordinate: [f64; 2],

    pub time: DateTime<Utc>,

    /// Filter field values, present when requested with `include`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_id: Option<UniqueId>,

    /// Columns this client does not know about yet
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    pub fn longitude(&self) -> f64 {
        self.coordinate[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinate[1]
    }
}
