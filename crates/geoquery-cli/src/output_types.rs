use geoquery_core::{DatasetSchema, UniqueId};
use geoquery_stream::Record;
use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

/// Output for count command
#[derive(Debug, Serialize)]
pub struct CountOutput {
    pub dataset_id: String,
    pub count: u64,
}

/// One row of the ids command
#[derive(Debug, Serialize, Tabled)]
pub struct UniqueIdCountRow {
    #[tabled(rename = "Unique ID")]
    pub id: UniqueId,
    #[tabled(rename = "Count")]
    pub count: u64,
}

impl UniqueIdCountRow {
    /// Largest count first, ties by id
    pub fn sorted(counts: impl IntoIterator<Item = (UniqueId, u64)>) -> Vec<Self> {
        let mut rows: Vec<Self> = counts.into_iter().map(|(id, count)| Self { id, count }).collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.id.cmp(&b.id)));
        rows
    }
}

/// One row of the records command
#[derive(Debug, Serialize, Tabled)]
pub struct RecordRow {
    #[tabled(rename = "ID")]
    pub id: UniqueId,
    #[tabled(rename = "Time")]
    pub time: String,
    #[tabled(rename = "Longitude")]
    pub longitude: f64,
    #[tabled(rename = "Latitude")]
    pub latitude: f64,
    #[tabled(rename = "Fields")]
    pub fields: String,
}

impl From<&Record> for RecordRow {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            time: record.time.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            longitude: record.longitude(),
            latitude: record.latitude(),
            fields: record
                .fields
                .as_ref()
                .map(|fields| Value::Object(fields.clone()).to_string())
                .unwrap_or_default(),
        }
    }
}

/// One row of the schema command
#[derive(Debug, Serialize, Tabled)]
pub struct SchemaFieldRow {
    #[tabled(rename = "Field")]
    pub name: String,
    #[tabled(rename = "Type")]
    pub field_type: String,
    #[tabled(rename = "Signed")]
    pub signed: bool,
    #[tabled(rename = "Nullable")]
    pub nullable: bool,
    #[tabled(rename = "Values")]
    pub values: String,
}

impl SchemaFieldRow {
    /// Rows in field name order
    pub fn from_schema(schema: &DatasetSchema) -> Vec<Self> {
        let mut names: Vec<&str> = schema.field_names().collect();
        names.sort_unstable();
        names
            .into_iter()
            .filter_map(|name| {
                schema.get(name).map(|field| Self {
                    name: name.to_string(),
                    field_type: field.field_type.to_string(),
                    signed: field.is_signed(),
                    nullable: field.is_nullable(),
                    values: field.values.as_ref().map(|v| v.join(", ")).unwrap_or_default(),
                })
            })
            .collect()
    }
}

/// One row of the config command
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}
