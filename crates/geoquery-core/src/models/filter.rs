//! Typed field predicates and the newest/oldest selector.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ValidationError};
use crate::models::schema::{DatasetSchema, SchemaField, SchemaFieldType};

pub const UINT32_MIN: i64 = 0;
pub const UINT32_MAX: i64 = 4_294_967_295;
pub const INT32_MIN: i64 = -2_147_483_648;
pub const INT32_MAX: i64 = 2_147_483_647;
const NUM_IPV4_OCTETS: usize = 4;

/// Kind of a filter field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    SignedNumber,
    UnsignedNumber,
    Ip,
    Enum,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::SignedNumber => "signed number",
            FieldKind::UnsignedNumber => "unsigned number",
            FieldKind::Ip => "ip",
            FieldKind::Enum => "enum",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::SignedNumber | FieldKind::UnsignedNumber)
    }

    /// Operators accepted for this kind, independent of any schema
    pub fn permits(&self, operator: FilterOperator) -> bool {
        match self {
            FieldKind::SignedNumber | FieldKind::UnsignedNumber => true,
            FieldKind::Ip | FieldKind::Enum => {
                matches!(operator, FilterOperator::Eq | FilterOperator::Neq)
            }
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace(['_', '-'], " ").as_str() {
            "signed number" | "signed" | "int" => Ok(FieldKind::SignedNumber),
            "unsigned number" | "unsigned" | "uint" => Ok(FieldKind::UnsignedNumber),
            "ip" => Ok(FieldKind::Ip),
            "enum" => Ok(FieldKind::Enum),
            _ => Err(ValidationError::UnknownFieldKind(s.to_string())),
        }
    }
}

/// Comparison applied to a filter field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Lt,
    Gt,
    Gte,
    Lte,
    Eq,
    Neq,
    Between,
    Outside,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 8] = [
        FilterOperator::Lt,
        FilterOperator::Gt,
        FilterOperator::Gte,
        FilterOperator::Lte,
        FilterOperator::Eq,
        FilterOperator::Neq,
        FilterOperator::Between,
        FilterOperator::Outside,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Lt => "lt",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lte => "lte",
            FilterOperator::Eq => "eq",
            FilterOperator::Neq => "neq",
            FilterOperator::Between => "between",
            FilterOperator::Outside => "outside",
        }
    }

    /// `between` and `outside` take a two element range
    pub fn is_range(&self) -> bool {
        matches!(self, FilterOperator::Between | FilterOperator::Outside)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.to_lowercase();
        FilterOperator::ALL
            .into_iter()
            .find(|op| op.as_str() == name)
            .ok_or_else(|| ValidationError::UnknownOperator(s.to_string()))
    }
}

/// Value compared against a filter field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Number(i64),
    Text(String),
    Numbers(Vec<i64>),
    Texts(Vec<String>),
}

impl FieldValue {
    pub fn range(low: i64, high: i64) -> Self {
        FieldValue::Numbers(vec![low, high])
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Number(n) => Value::from(*n),
            FieldValue::Text(s) => Value::from(s.as_str()),
            FieldValue::Numbers(ns) => Value::from(ns.clone()),
            FieldValue::Texts(ss) => Value::from(ss.clone()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(i64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Number(i64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<i64>> for FieldValue {
    fn from(values: Vec<i64>) -> Self {
        FieldValue::Numbers(values)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::Texts(values)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Predicate on a named dataset field
///
/// Validation runs in two stages. The kind/operator check always runs; the
/// schema checks (name, type, nullability, value) only run when a schema is
/// supplied through [`FilterField::with_schema`] or [`FilterField::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct FilterField {
    name: String,
    kind: FieldKind,
    value: FieldValue,
    operator: FilterOperator,
    nullable: bool,
}

impl FilterField {
    pub fn new(
        name: impl Into<String>,
        kind: FieldKind,
        operator: FilterOperator,
        value: impl Into<FieldValue>,
    ) -> Result<Self> {
        let field = Self {
            name: name.into(),
            kind,
            value: value.into(),
            operator,
            nullable: false,
        };
        field.validate_operation()?;
        Ok(field)
    }

    /// Mark the field as nullable; checked against the schema by [`FilterField::with_schema`]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Run the schema stage against `schema`, consuming and returning the field
    pub fn with_schema(self, schema: &DatasetSchema) -> Result<Self> {
        self.validate(Some(schema))?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn validate(&self, schema: Option<&DatasetSchema>) -> Result<()> {
        self.validate_operation()?;

        let Some(schema) = schema else {
            return Ok(());
        };

        let schema_field = schema.get(&self.name).ok_or_else(|| {
            ValidationError::FilterFieldNameNotInSchema {
                name: self.name.clone(),
            }
        })?;

        self.validate_type(schema_field)?;
        self.validate_nullability(schema_field)?;
        self.validate_value(schema_field)
    }

    /// `{name: {operator: value}}`
    pub fn build(&self) -> Value {
        let mut predicate = Map::new();
        predicate.insert(self.operator.as_str().to_string(), self.value.to_json());

        let mut field = Map::new();
        field.insert(self.name.clone(), Value::Object(predicate));
        Value::Object(field)
    }

    fn validate_operation(&self) -> Result<()> {
        let invalid = |reason: &str| ValidationError::FilterFieldOperationValue {
            name: self.name.clone(),
            kind: self.kind.to_string(),
            operator: self.operator.to_string(),
            reason: reason.to_string(),
        };

        if !self.kind.permits(self.operator) {
            return Err(invalid("only eq and neq are permitted"));
        }

        if self.operator.is_range() {
            match &self.value {
                FieldValue::Numbers(range) if range.len() == 2 => {}
                _ => return Err(invalid("a range of exactly two numbers is required")),
            }
        }

        Ok(())
    }

    fn validate_type(&self, schema_field: &SchemaField) -> Result<()> {
        let matches = match (schema_field.field_type, self.kind) {
            (SchemaFieldType::Ip, FieldKind::Ip) | (SchemaFieldType::Enum, FieldKind::Enum) => true,
            (SchemaFieldType::Number, FieldKind::SignedNumber) => schema_field.is_signed(),
            (SchemaFieldType::Number, FieldKind::UnsignedNumber) => !schema_field.is_signed(),
            _ => false,
        };

        if matches {
            return Ok(());
        }

        let schema_type = match (schema_field.field_type, schema_field.signed) {
            (SchemaFieldType::Number, Some(signed)) => format!("number, signed={}", signed),
            (field_type, _) => field_type.to_string(),
        };

        Err(ValidationError::FilterFieldType {
            name: self.name.clone(),
            kind: self.kind.to_string(),
            schema_type,
        })
    }

    fn validate_nullability(&self, schema_field: &SchemaField) -> Result<()> {
        match (self.nullable, schema_field.nullable) {
            (true, None | Some(false)) | (false, Some(true)) => {
                Err(ValidationError::FilterFieldInvalidNullability {
                    name: self.name.clone(),
                    nullable: self.nullable,
                    schema_nullable: schema_field.is_nullable(),
                })
            }
            _ => Ok(()),
        }
    }

    fn validate_value(&self, schema_field: &SchemaField) -> Result<()> {
        let invalid = |value: &dyn fmt::Display, reason: String| ValidationError::FilterFieldValue {
            name: self.name.clone(),
            value: value.to_string(),
            reason,
        };

        if self.value.is_null() {
            return if self.nullable {
                Ok(())
            } else {
                Err(invalid(&self.value, "field is not nullable".to_string()))
            };
        }

        match self.kind {
            FieldKind::SignedNumber | FieldKind::UnsignedNumber => {
                let (min, max, label) = if self.kind == FieldKind::SignedNumber {
                    (INT32_MIN, INT32_MAX, "INT32")
                } else {
                    (UINT32_MIN, UINT32_MAX, "UINT32")
                };

                let numbers = match &self.value {
                    FieldValue::Number(n) => std::slice::from_ref(n),
                    FieldValue::Numbers(ns) => ns.as_slice(),
                    other => return Err(invalid(other, format!("not a valid {} number", label))),
                };

                for n in numbers {
                    if *n < min || *n > max {
                        return Err(invalid(n, format!("not within {} bounds [{}, {}]", label, min, max)));
                    }
                }
                Ok(())
            }
            FieldKind::Ip => match &self.value {
                FieldValue::Text(addr) => validate_ipv4(addr).map_err(|reason| invalid(addr, reason)),
                other => Err(invalid(other, "not a valid ipv4 string".to_string())),
            },
            FieldKind::Enum => {
                let FieldValue::Text(value) = &self.value else {
                    return Err(invalid(&self.value, "not a valid enum string".to_string()));
                };
                let allowed = schema_field
                    .values
                    .as_ref()
                    .ok_or_else(|| invalid(value, "schema declares no enum values".to_string()))?;

                if allowed.iter().any(|v| v == value) {
                    Ok(())
                } else {
                    Err(invalid(value, "not an enum value registered in the dataset".to_string()))
                }
            }
        }
    }
}

fn validate_ipv4(addr: &str) -> std::result::Result<(), String> {
    let octets: Vec<&str> = addr.split('.').collect();
    if octets.len() != NUM_IPV4_OCTETS {
        return Err(format!("ip values should have 4 octets, found {}", octets.len()));
    }

    for octet in octets {
        if octet.parse::<u8>().is_err() {
            return Err(format!("octet '{}' not within [0, 255]", octet));
        }
    }
    Ok(())
}

/// Restrict results to the newest or oldest record per entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Only {
    Newest,
    Oldest,
}

impl Only {
    pub fn as_str(&self) -> &'static str {
        match self {
            Only::Newest => "newest",
            Only::Oldest => "oldest",
        }
    }
}

impl fmt::Display for Only {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Only {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "newest" => Ok(Only::Newest),
            "oldest" => Ok(Only::Oldest),
            _ => Err(ValidationError::UnknownOnly(s.to_string())),
        }
    }
}
