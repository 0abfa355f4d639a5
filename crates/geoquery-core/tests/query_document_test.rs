//! Integration tests for assembling complete query documents

use geoquery_core::{
    BoundingBox, Count, DatasetSchema, FieldKind, FieldValue, FilterField, FilterOperator, GroupBy,
    IncludeField, Only, Polygon, QueryDocument, QueryFilters, Records, SchemaField, TimeRange,
    UniqueId, ValidationError,
};
use serde_json::json;

const SQUARE: &str = r#"{
    "type": "Polygon",
    "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
}"#;

#[test]
fn test_only_with_count_is_invalid() {
    let filters = QueryFilters {
        only: Some(Only::Newest),
        ..Default::default()
    };
    let result = QueryDocument::with_filters("dataset", Count::new(), filters.clone());
    assert!(matches!(result, Err(ValidationError::InvalidQueryDocument { .. })));

    let document = QueryDocument::with_filters("dataset", Records::new(), filters).unwrap();
    assert_eq!(document.only(), Some(Only::Newest));
}

#[test]
fn test_records_document_with_every_filter() {
    let polygon = Polygon::from_geojson_str(SQUARE).unwrap();
    let time_range =
        TimeRange::from_strings(Some("2023-05-01T00:00:00+00:00"), Some("2023-05-02T00:00:00+00:00"))
            .unwrap();
    let records = Records::with_include([IncludeField::Fields, IncludeField::MetadataId]).unwrap();

    let filters = QueryFilters {
        uids: Some(vec![UniqueId::from("vehicle-1")]),
        geometry: Some(polygon.into()),
        time_range: Some(time_range),
        filter_fields: Some(vec![
            FilterField::new("colour", FieldKind::Enum, FilterOperator::Eq, "red").unwrap(),
            FilterField::new("speed", FieldKind::SignedNumber, FilterOperator::Between, FieldValue::range(-1, 5))
                .unwrap(),
        ]),
        only: Some(Only::Oldest),
    };

    let document = QueryDocument::with_filters("dataset", records, filters).unwrap();
    let built = document.build().unwrap();

    assert_eq!(
        built,
        json!({
            "datasetId": "dataset",
            "filters": {
                "fields": {
                    "colour": {"eq": "red"},
                    "speed": {"between": [-1, 5]}
                },
                "geo": {
                    "type": "Polygon",
                    "coordinates": [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]
                },
                "id": ["vehicle-1"],
                "only": "oldest",
                "time": {
                    "minTime": "2023-05-01T00:00:00+00:00",
                    "maxTime": "2023-05-02T00:00:00+00:00"
                }
            },
            "return": {"type": "records", "include": ["fields", "metadataId"]}
        })
    );

    // Serialized text is deterministic across builds
    let first = serde_json::to_string(&built).unwrap();
    let second = serde_json::to_string(&document.build().unwrap()).unwrap();
    assert_eq!(first, second);
    assert!(first.starts_with(r#"{"datasetId":"dataset","filters":{"fields""#));
}

#[test]
fn test_grouped_count_document() {
    let mut document = QueryDocument::new("dataset", Count::grouped(GroupBy::UniqueId)).unwrap();
    document
        .set_geometry(Some(BoundingBox::from_slice(&[-1.0, -1.0, 1.0, 1.0]).unwrap().into()))
        .unwrap();

    assert_eq!(
        document.build().unwrap(),
        json!({
            "datasetId": "dataset",
            "filters": {"geo": {"type": "BoundingBox", "bounds": [-1.0, -1.0, 1.0, 1.0]}},
            "return": {"type": "count", "groupBy": {"type": "uniqueId"}}
        })
    );
}

#[test]
fn test_failed_setter_leaves_document_unchanged() {
    let mut document = QueryDocument::new("dataset", Records::new()).unwrap();
    document.set_geometry(Some(BoundingBox::default().into())).unwrap_err();
    document.set_time_range(Some(TimeRange::default())).unwrap_err();

    assert!(document.geometry().is_none());
    assert!(document.time_range().is_none());
    assert_eq!(document.build().unwrap()["filters"], json!({}));
}

#[test]
fn test_schema_attached_after_fields_revalidates() {
    let mut document = QueryDocument::new("dataset", Count::new()).unwrap();
    document
        .set_filter_field(FilterField::new("addr", FieldKind::Ip, FilterOperator::Eq, "10.0.0.300").unwrap())
        .unwrap();

    let schema = DatasetSchema::new().with_field("addr", SchemaField::ip());
    assert!(matches!(
        document.set_schema(Some(schema)),
        Err(ValidationError::FilterFieldValue { .. })
    ));
    assert!(document.schema().is_none());
}
