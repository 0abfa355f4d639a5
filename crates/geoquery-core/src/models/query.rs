use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::filter::{FilterField, Only};
use super::geometry::Geometry;
use super::returns::ReturnModel;
use super::schema::DatasetSchema;
use super::time_range::TimeRange;
use super::uid::UniqueId;
use crate::error::{Result, ValidationError};

const DATASET_ID: &str = "datasetId";
const FILTERS: &str = "filters";
const RETURN_MODEL: &str = "return";
const FILTER_FIELDS: &str = "fields";
const GEOMETRY: &str = "geo";
const IDS: &str = "id";
const ONLY: &str = "only";
const TIME: &str = "time";

/// Optional filters accepted by [`QueryDocument::with_filters`]
#[derive(Debug, Clone, Default)]
pub struct QueryFilters {
    pub uids: Option<Vec<UniqueId>>,
    pub geometry: Option<Geometry>,
    pub time_range: Option<TimeRange>,
    pub filter_fields: Option<Vec<FilterField>>,
    pub only: Option<Only>,
}

/// A validated description of one query
///
/// Every setter validates the document as it would look after the change and
/// leaves it untouched on error, so a `QueryDocument` is always buildable.
#[derive(Debug, Clone)]
pub struct QueryDocument {
    dataset_id: String,
    return_model: ReturnModel,
    uids: Option<Vec<UniqueId>>,
    geometry: Option<Geometry>,
    time_range: Option<TimeRange>,
    filter_fields: BTreeMap<String, FilterField>,
    only: Option<Only>,
    schema: Option<DatasetSchema>,
}

impl QueryDocument {
    pub fn new(dataset_id: impl Into<String>, return_model: impl Into<ReturnModel>) -> Result<Self> {
        let document = Self {
            dataset_id: dataset_id.into(),
            return_model: return_model.into(),
            uids: None,
            geometry: None,
            time_range: None,
            filter_fields: BTreeMap::new(),
            only: None,
            schema: None,
        };
        document.validate()?;
        Ok(document)
    }

    /// Construct a document with every optional filter in one call
    pub fn with_filters(
        dataset_id: impl Into<String>,
        return_model: impl Into<ReturnModel>,
        filters: QueryFilters,
    ) -> Result<Self> {
        let mut document = Self::new(dataset_id, return_model)?;
        document
            .set_uids(filters.uids)?
            .set_geometry(filters.geometry)?
            .set_time_range(filters.time_range)?
            .set_only(filters.only)?
            .set_filter_fields(filters.filter_fields)?;
        Ok(document)
    }

    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    pub fn return_model(&self) -> &ReturnModel {
        &self.return_model
    }

    pub fn uids(&self) -> Option<&[UniqueId]> {
        self.uids.as_deref()
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    pub fn time_range(&self) -> Option<&TimeRange> {
        self.time_range.as_ref()
    }

    pub fn only(&self) -> Option<Only> {
        self.only
    }

    pub fn schema(&self) -> Option<&DatasetSchema> {
        self.schema.as_ref()
    }

    /// Filter fields ordered by name
    pub fn filter_fields(&self) -> impl Iterator<Item = &FilterField> {
        self.filter_fields.values()
    }

    pub fn filter_field(&self, name: &str) -> Option<&FilterField> {
        self.filter_fields.get(name)
    }

    pub fn set_dataset_id(&mut self, dataset_id: impl Into<String>) -> Result<&mut Self> {
        let dataset_id = dataset_id.into();
        validate_dataset_id(&dataset_id)?;
        self.dataset_id = dataset_id;
        Ok(self)
    }

    pub fn set_return_model(&mut self, return_model: impl Into<ReturnModel>) -> Result<&mut Self> {
        let return_model = return_model.into();
        validate_only(self.only, &return_model)?;
        self.return_model = return_model;
        Ok(self)
    }

    pub fn set_uids(&mut self, uids: Option<Vec<UniqueId>>) -> Result<&mut Self> {
        self.uids = uids;
        Ok(self)
    }

    pub fn set_geometry(&mut self, geometry: Option<Geometry>) -> Result<&mut Self> {
        if let Some(geometry) = &geometry {
            geometry.validate()?;
        }
        self.geometry = geometry;
        Ok(self)
    }

    pub fn set_time_range(&mut self, time_range: Option<TimeRange>) -> Result<&mut Self> {
        if let Some(time_range) = &time_range {
            time_range.validate()?;
        }
        self.time_range = time_range;
        Ok(self)
    }

    pub fn set_only(&mut self, only: Option<Only>) -> Result<&mut Self> {
        validate_only(only, &self.return_model)?;
        self.only = only;
        Ok(self)
    }

    /// Add a filter field, replacing any earlier field with the same name
    pub fn set_filter_field(&mut self, filter_field: FilterField) -> Result<&mut Self> {
        filter_field.validate(self.schema.as_ref())?;
        self.filter_fields
            .insert(filter_field.name().to_string(), filter_field);
        Ok(self)
    }

    /// Add each field in turn; `None` removes every filter field
    pub fn set_filter_fields(&mut self, filter_fields: Option<Vec<FilterField>>) -> Result<&mut Self> {
        let Some(filter_fields) = filter_fields else {
            self.filter_fields.clear();
            return Ok(self);
        };

        for field in &filter_fields {
            field.validate(self.schema.as_ref())?;
        }
        for field in filter_fields {
            self.filter_fields.insert(field.name().to_string(), field);
        }
        Ok(self)
    }

    /// Attach a dataset schema; current and future filter fields are checked against it
    pub fn set_schema(&mut self, schema: Option<DatasetSchema>) -> Result<&mut Self> {
        if let Some(schema) = &schema {
            for field in self.filter_fields.values() {
                field.validate(Some(schema))?;
            }
        }
        self.schema = schema;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        validate_dataset_id(&self.dataset_id)?;
        validate_only(self.only, &self.return_model)?;

        if let Some(geometry) = &self.geometry {
            geometry.validate()?;
        }
        if let Some(time_range) = &self.time_range {
            time_range.validate()?;
        }
        for field in self.filter_fields.values() {
            field.validate(self.schema.as_ref())?;
        }
        Ok(())
    }

    /// `{"datasetId": ..., "filters": {fields?, geo?, id?, only?, time?}, "return": {...}}`
    ///
    /// Objects are key-sorted at every level.
    pub fn build(&self) -> Result<Value> {
        self.validate()?;

        let mut filters = Map::new();

        if !self.filter_fields.is_empty() {
            let mut fields = Map::new();
            for field in self.filter_fields.values() {
                if let Value::Object(built) = field.build() {
                    fields.extend(built);
                }
            }
            filters.insert(FILTER_FIELDS.to_string(), Value::Object(fields));
        }
        if let Some(geometry) = &self.geometry {
            filters.insert(GEOMETRY.to_string(), geometry.build()?);
        }
        if let Some(uids) = &self.uids {
            let ids = serde_json::to_value(uids).map_err(|e| ValidationError::InvalidQueryDocument {
                reason: e.to_string(),
            })?;
            filters.insert(IDS.to_string(), ids);
        }
        if let Some(only) = self.only {
            filters.insert(ONLY.to_string(), Value::from(only.as_str()));
        }
        if let Some(time_range) = &self.time_range {
            filters.insert(TIME.to_string(), time_range.build()?);
        }

        let mut document = Map::new();
        document.insert(DATASET_ID.to_string(), Value::from(self.dataset_id.as_str()));
        document.insert(FILTERS.to_string(), Value::Object(filters));
        document.insert(RETURN_MODEL.to_string(), self.return_model.build());
        Ok(Value::Object(document))
    }
}

fn validate_dataset_id(dataset_id: &str) -> Result<()> {
    if dataset_id.trim().is_empty() {
        return Err(ValidationError::InvalidQueryDocument {
            reason: "QueryDocument must have a dataset_id".to_string(),
        });
    }
    Ok(())
}

fn validate_only(only: Option<Only>, return_model: &ReturnModel) -> Result<()> {
    match (only, return_model) {
        (Some(only), ReturnModel::Count(_)) => Err(ValidationError::InvalidQueryDocument {
            reason: format!("'{}' filter is only valid combined with a 'records' return_model", only),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::filter::{FieldKind, FilterOperator};
    use crate::models::geometry::BoundingBox;
    use crate::models::returns::{Count, Records};
    use crate::models::schema::SchemaField;
    use serde_json::json;

    fn speed(op: FilterOperator, value: i64) -> FilterField {
        FilterField::new("speed", FieldKind::UnsignedNumber, op, value).unwrap()
    }

    #[test]
    fn test_minimal_document() {
        let document = QueryDocument::new("dataset-1", Count::new()).unwrap();
        assert_eq!(
            document.build().unwrap(),
            json!({"datasetId": "dataset-1", "filters": {}, "return": {"type": "count"}})
        );
    }

    #[test]
    fn test_empty_dataset_id() {
        assert!(matches!(
            QueryDocument::new("", Count::new()),
            Err(ValidationError::InvalidQueryDocument { .. })
        ));

        let mut document = QueryDocument::new("dataset-1", Count::new()).unwrap();
        assert!(document.set_dataset_id("  ").is_err());
        assert_eq!(document.dataset_id(), "dataset-1");
    }

    #[test]
    fn test_only_requires_records() {
        let mut document = QueryDocument::new("dataset-1", Count::new()).unwrap();
        assert!(matches!(
            document.set_only(Some(Only::Newest)),
            Err(ValidationError::InvalidQueryDocument { .. })
        ));
        assert_eq!(document.only(), None);

        let mut document = QueryDocument::new("dataset-1", Records::new()).unwrap();
        document.set_only(Some(Only::Newest)).unwrap();
        assert_eq!(document.build().unwrap()["filters"]["only"], "newest");

        // Switching back to a count while `only` is set is rejected as well
        assert!(document.set_return_model(Count::new()).is_err());
        assert!(document.return_model().is_records());
    }

    #[test]
    fn test_full_document_shape() {
        let mut document = QueryDocument::new("dataset-1", Records::new()).unwrap();
        document
            .set_uids(Some(vec![UniqueId::from("a"), UniqueId::from(2)]))
            .unwrap()
            .set_geometry(Some(BoundingBox::from_corners(0.0, 0.0, 1.0, 1.0).unwrap().into()))
            .unwrap()
            .set_time_range(Some(TimeRange::from_millis_utc(Some(0), None).unwrap()))
            .unwrap()
            .set_filter_field(speed(FilterOperator::Gt, 10))
            .unwrap();

        let built = document.build().unwrap();
        assert_eq!(
            built,
            json!({
                "datasetId": "dataset-1",
                "filters": {
                    "fields": {"speed": {"gt": 10}},
                    "geo": {"type": "BoundingBox", "bounds": [0.0, 0.0, 1.0, 1.0]},
                    "id": ["a", 2],
                    "time": {"minTime": "1970-01-01T00:00:00+00:00", "maxTime": null}
                },
                "return": {"type": "records"}
            })
        );

        let keys: Vec<&String> = built.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["datasetId", "filters", "return"]);
    }

    #[test]
    fn test_none_removes_keys() {
        let mut document = QueryDocument::new("dataset-1", Records::new()).unwrap();
        document
            .set_uids(Some(vec![UniqueId::from(1)]))
            .unwrap()
            .set_only(Some(Only::Oldest))
            .unwrap();
        document.set_uids(None).unwrap().set_only(None).unwrap();

        assert_eq!(document.build().unwrap()["filters"], json!({}));
    }

    #[test]
    fn test_filter_fields_last_write_wins() {
        let mut document = QueryDocument::new("dataset-1", Count::new()).unwrap();
        document
            .set_filter_field(speed(FilterOperator::Gt, 10))
            .unwrap()
            .set_filter_field(speed(FilterOperator::Lt, 20))
            .unwrap();
        assert_eq!(
            document.build().unwrap()["filters"]["fields"],
            json!({"speed": {"lt": 20}})
        );

        document.set_filter_fields(None).unwrap();
        assert!(document.build().unwrap()["filters"].get("fields").is_none());
    }

    #[test]
    fn test_schema_checks_filter_fields() {
        let schema = DatasetSchema::new().with_field("speed", SchemaField::number(false));
        let mut document = QueryDocument::new("dataset-1", Count::new()).unwrap();
        document.set_schema(Some(schema)).unwrap();

        let unknown = FilterField::new("heading", FieldKind::UnsignedNumber, FilterOperator::Eq, 1).unwrap();
        assert!(matches!(
            document.set_filter_field(unknown),
            Err(ValidationError::FilterFieldNameNotInSchema { .. })
        ));
        assert_eq!(document.filter_fields().count(), 0);
    }

    #[test]
    fn test_with_filters_rejects_only_on_count() {
        let filters = QueryFilters {
            only: Some(Only::Newest),
            ..Default::default()
        };
        assert!(QueryDocument::with_filters("dataset-1", Count::new(), filters).is_err());
    }
}
