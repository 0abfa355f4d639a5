//! Dataset schema as returned by the service, used to strengthen filter field checks.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Declared type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaFieldType {
    Number,
    Ip,
    Enum,
    #[serde(other)]
    Other,
}

impl fmt::Display for SchemaFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchemaFieldType::Number => "number",
            SchemaFieldType::Ip => "ip",
            SchemaFieldType::Enum => "enum",
            SchemaFieldType::Other => "other",
        };
        f.write_str(name)
    }
}

/// One field of a dataset schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    #[serde(rename = "type")]
    pub field_type: SchemaFieldType,

    /// Only meaningful for numbers; absent means unsigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed: Option<bool>,

    /// Absent means not nullable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    /// Allowed values of an enum field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

impl SchemaField {
    pub fn number(signed: bool) -> Self {
        Self {
            field_type: SchemaFieldType::Number,
            signed: Some(signed),
            nullable: None,
            values: None,
        }
    }

    pub fn ip() -> Self {
        Self {
            field_type: SchemaFieldType::Ip,
            signed: None,
            nullable: None,
            values: None,
        }
    }

    pub fn enumeration(values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            field_type: SchemaFieldType::Enum,
            signed: None,
            nullable: None,
            values: Some(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    pub fn is_signed(&self) -> bool {
        self.signed.unwrap_or(false)
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable.unwrap_or(false)
    }
}

/// Mapping from field name to its declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetSchema {
    fields: HashMap<String, SchemaField>,
}

impl DatasetSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, field: SchemaField) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    pub fn get(&self, name: &str) -> Option<&SchemaField> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_from_json() {
        let schema: DatasetSchema = serde_json::from_str(
            r#"{
                "speed": {"type": "number", "signed": true},
                "count": {"type": "number", "nullable": true},
                "addr": {"type": "ip"},
                "colour": {"type": "enum", "values": ["red", "green"]},
                "blob": {"type": "binary"}
            }"#,
        )
        .unwrap();

        assert_eq!(schema.len(), 5);
        assert!(schema.get("speed").unwrap().is_signed());
        assert!(!schema.get("count").unwrap().is_signed());
        assert!(schema.get("count").unwrap().is_nullable());
        assert_eq!(schema.get("addr").unwrap().field_type, SchemaFieldType::Ip);
        assert_eq!(
            schema.get("colour").unwrap().values,
            Some(vec!["red".to_string(), "green".to_string()])
        );
        assert_eq!(schema.get("blob").unwrap().field_type, SchemaFieldType::Other);
    }
}
