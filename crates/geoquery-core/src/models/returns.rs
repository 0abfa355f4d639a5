//! Return-shape selectors: scalar/grouped counts or raw records.

use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ValidationError};

/// Grouping applied to a count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    UniqueId,
}

impl GroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::UniqueId => "uniqueId",
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupBy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "uniqueId" | "unique_id" => Ok(GroupBy::UniqueId),
            _ => Err(ValidationError::UnknownGroupBy(s.to_string())),
        }
    }
}

/// Count return model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Count {
    group_by: Option<GroupBy>,
}

impl Count {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grouped(group_by: GroupBy) -> Self {
        Self {
            group_by: Some(group_by),
        }
    }

    pub fn group_by(&self) -> Option<GroupBy> {
        self.group_by
    }

    pub fn build(&self) -> Value {
        let mut model = json!({"type": "count"});
        if let Some(group_by) = self.group_by {
            model["groupBy"] = json!({"type": group_by.as_str()});
        }
        model
    }
}

/// Extra columns returned alongside records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncludeField {
    Fields,
    MetadataId,
}

impl IncludeField {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncludeField::Fields => "fields",
            IncludeField::MetadataId => "metadataId",
        }
    }
}

impl fmt::Display for IncludeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncludeField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fields" => Ok(IncludeField::Fields),
            "metadataId" | "metadata_id" => Ok(IncludeField::MetadataId),
            _ => Err(ValidationError::UnknownIncludeField(s.to_string())),
        }
    }
}

/// Records return model
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Records {
    include: Option<Vec<IncludeField>>,
}

impl Records {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request extra columns; the list keeps the caller's order and must not be empty
    pub fn with_include(include: impl IntoIterator<Item = IncludeField>) -> Result<Self> {
        let include: Vec<IncludeField> = include.into_iter().collect();
        if include.is_empty() {
            return Err(ValidationError::EmptyInclude);
        }
        Ok(Self {
            include: Some(include),
        })
    }

    pub fn include(&self) -> Option<&[IncludeField]> {
        self.include.as_deref()
    }

    pub fn build(&self) -> Value {
        let mut model = json!({"type": "records"});
        if let Some(include) = &self.include {
            let names: Vec<&str> = include.iter().map(IncludeField::as_str).collect();
            model["include"] = json!(names);
        }
        model
    }
}

/// How the service should shape the result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnModel {
    Count(Count),
    Records(Records),
}

impl ReturnModel {
    pub fn build(&self) -> Value {
        match self {
            ReturnModel::Count(count) => count.build(),
            ReturnModel::Records(records) => records.build(),
        }
    }

    pub fn is_records(&self) -> bool {
        matches!(self, ReturnModel::Records(_))
    }
}

impl From<Count> for ReturnModel {
    fn from(count: Count) -> Self {
        ReturnModel::Count(count)
    }
}

impl From<Records> for ReturnModel {
    fn from(records: Records) -> Self {
        ReturnModel::Records(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_build() {
        assert_eq!(Count::new().build(), json!({"type": "count"}));
        assert_eq!(
            Count::grouped(GroupBy::UniqueId).build(),
            json!({"type": "count", "groupBy": {"type": "uniqueId"}})
        );
    }

    #[test]
    fn test_records_build_keeps_include_order() {
        assert_eq!(Records::new().build(), json!({"type": "records"}));

        let records = Records::with_include([IncludeField::MetadataId, IncludeField::Fields]).unwrap();
        assert_eq!(
            records.build(),
            json!({"type": "records", "include": ["metadataId", "fields"]})
        );
    }

    #[test]
    fn test_records_empty_include() {
        assert_eq!(Records::with_include([]), Err(ValidationError::EmptyInclude));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("uniqueId".parse::<GroupBy>().unwrap(), GroupBy::UniqueId);
        assert!(matches!("dataset".parse::<GroupBy>(), Err(ValidationError::UnknownGroupBy(_))));
        assert_eq!("metadataId".parse::<IncludeField>().unwrap(), IncludeField::MetadataId);
        assert!(matches!(
            "geometry".parse::<IncludeField>(),
            Err(ValidationError::UnknownIncludeField(_))
        ));
    }
}
