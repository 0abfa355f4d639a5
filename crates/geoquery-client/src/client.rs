use std::collections::HashMap;

use geoquery_core::{
    Count, DatasetSchema, GroupBy, IncludeField, QueryDocument, QueryFilters, Records, ReturnModel, UniqueId,
    ValidationError,
};
use geoquery_stream::{
    Accumulator, CountAccumulator, EventReader, GroupedCountAccumulator, NoProgress, ProgressObserver,
    QueryResult, Record, RecordsAccumulator, ResultMode, StreamConsumer,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::management::{InstrumentationFilter, ManageOperation};
use crate::transport::{HttpTransport, Transport};

pub const QUERY_PATH: &str = "v1/query";
pub const INSTRUMENTATION_PATH: &str = "v1/query/instrumentation";
pub const MANAGE_PATH: &str = "v1/query/manage";

/// Runs queries against the query service
///
/// Each call submits one document and consumes its result stream to completion.
/// Nothing is retried; see [`ClientError::is_retryable`].
pub struct QueryClient<T: Transport = HttpTransport> {
    transport: T,

    /// Document submitted by the most recent query call
    document: Option<Value>,

    observer: Box<dyn ProgressObserver + Send>,
}

impl<T: Transport> QueryClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            document: None,
            observer: Box::new(NoProgress),
        }
    }

    /// Report progress of every subsequent query to `observer`
    pub fn with_observer(mut self, observer: impl ProgressObserver + Send + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The document sent by the most recent query, whether or not it succeeded
    pub fn document(&self) -> Option<&Value> {
        self.document.as_ref()
    }

    /// Count the records matching `filters`
    pub fn count(&mut self, dataset_id: &str, filters: QueryFilters) -> Result<u64> {
        let document = QueryDocument::with_filters(dataset_id, Count::new(), filters)?;
        self.submit(document.build()?, CountAccumulator::default())
    }

    /// Count the records matching `filters` per unique id
    pub fn unique_id_counts(&mut self, dataset_id: &str, filters: QueryFilters) -> Result<HashMap<UniqueId, u64>> {
        let document = QueryDocument::with_filters(dataset_id, Count::grouped(GroupBy::UniqueId), filters)?;
        self.submit(document.build()?, GroupedCountAccumulator::default())
    }

    /// Fetch the records matching `filters` in the order the service sends them
    pub fn records(
        &mut self,
        dataset_id: &str,
        filters: QueryFilters,
        include: Option<Vec<IncludeField>>,
    ) -> Result<Vec<Record>> {
        let records = match include {
            Some(include) => Records::with_include(include)?,
            None => Records::new(),
        };
        let document = QueryDocument::with_filters(dataset_id, records, filters)?;
        self.submit(document.build()?, RecordsAccumulator::default())
    }

    /// Run an already assembled document
    pub fn execute(&mut self, document: &QueryDocument) -> Result<QueryResult> {
        let mode = result_mode_of(document.return_model());
        self.submit_mode(document.build()?, mode)
    }

    /// Run a document that was built elsewhere
    ///
    /// The document is not validated; only its `return` shape is inspected to
    /// pick how the stream is consumed.
    pub fn raw_request(&mut self, document: Value) -> Result<QueryResult> {
        let mode = raw_result_mode(&document)?;
        self.submit_mode(document, mode)
    }

    /// Fetch the full schema of a dataset for filter field validation
    pub fn fetch_schema(&self, dataset_id: &str) -> Result<DatasetSchema> {
        require_dataset_id(dataset_id)?;
        let path = format!("v1/datasets/{}/schema", dataset_id);
        let response = self.transport.get_json(&path, &[("type", "full".to_string())])?;
        let schema = match serde_json::from_value(response)? {
            SchemaResponse::Wrapped { fields } => fields,
            SchemaResponse::Bare(schema) => schema,
        };
        debug!(dataset_id, fields = schema.len(), "Fetched dataset schema");
        Ok(schema)
    }

    /// List recent queries, newest first
    pub fn instrumentation(&self, filter: &InstrumentationFilter) -> Result<Value> {
        self.transport.get_json(INSTRUMENTATION_PATH, &filter.to_params())
    }

    /// Apply a management operation to a dataset
    pub fn manage(&self, dataset_id: &str, operation: ManageOperation) -> Result<Value> {
        require_dataset_id(dataset_id)?;
        info!(dataset_id, %operation, "Managing dataset");
        let body = json!({ "datasetId": dataset_id, "operation": operation.as_str() });
        self.transport.post_json(MANAGE_PATH, &body)
    }

    fn send(&mut self, document: Value) -> Result<Box<dyn std::io::Read + Send>> {
        debug!(document = %document, "Submitting query");
        let body = self.transport.post_stream(QUERY_PATH, &document);
        self.document = Some(document);
        body
    }

    fn submit<A: Accumulator>(&mut self, document: Value, accumulator: A) -> Result<A::Output> {
        let body = self.send(document)?;
        let output = StreamConsumer::new(accumulator, &mut *self.observer).run(EventReader::new(body))?;
        Ok(output)
    }

    fn submit_mode(&mut self, document: Value, mode: ResultMode) -> Result<QueryResult> {
        let body = self.send(document)?;
        Ok(mode.consume(body, &mut *self.observer)?)
    }
}

impl QueryClient<HttpTransport> {
    /// Create an HTTP client from resolved configuration
    pub fn from_config(config: &geoquery_core::config::LayeredConfig) -> Result<Self> {
        Ok(Self::new(HttpTransport::from_config(config)?))
    }
}

/// The consumption mode a return model produces
pub fn result_mode_of(model: &ReturnModel) -> ResultMode {
    match model {
        ReturnModel::Count(count) => match count.group_by() {
            Some(GroupBy::UniqueId) => ResultMode::GroupedCount,
            None => ResultMode::Count,
        },
        ReturnModel::Records(_) => ResultMode::Records,
    }
}

/// The consumption mode declared by a raw document's `return` entry
///
/// Accepts `"count"`, `{"type": "count"}`, `{"type": "count", "groupBy": {"type": "uniqueId"}}`
/// and `{"type": "records", ...}`.
pub fn raw_result_mode(document: &Value) -> Result<ResultMode> {
    let unknown = |found: Option<&Value>| ClientError::UnknownReturnType {
        found: found.map_or_else(|| "nothing".to_string(), Value::to_string),
    };

    let declared = document.get("return");
    match declared {
        Some(Value::String(kind)) if kind == "count" => Ok(ResultMode::Count),
        Some(Value::Object(model)) => match model.get("type").and_then(Value::as_str) {
            Some("count") => match model.get("groupBy") {
                None | Some(Value::Null) => Ok(ResultMode::Count),
                Some(group_by) if group_by.get("type").and_then(Value::as_str) == Some(GroupBy::UniqueId.as_str()) => {
                    Ok(ResultMode::GroupedCount)
                }
                Some(_) => Err(unknown(declared)),
            },
            Some("records") => Ok(ResultMode::Records),
            _ => Err(unknown(declared)),
        },
        _ => Err(unknown(declared)),
    }
}

fn require_dataset_id(dataset_id: &str) -> std::result::Result<(), ValidationError> {
    if dataset_id.trim().is_empty() {
        return Err(ValidationError::InvalidQueryDocument {
            reason: "dataset id must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Schema endpoint body, either the field mapping itself or wrapped in `fields`
#[derive(Deserialize)]
#[serde(untagged)]
enum SchemaResponse {
    Wrapped { fields: DatasetSchema },
    Bare(DatasetSchema),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_result_mode() {
        assert_eq!(raw_result_mode(&json!({"return": "count"})).unwrap(), ResultMode::Count);
        assert_eq!(
            raw_result_mode(&json!({"return": {"type": "count"}})).unwrap(),
            ResultMode::Count
        );
        assert_eq!(
            raw_result_mode(&json!({"return": {"type": "count", "groupBy": {"type": "uniqueId"}}})).unwrap(),
            ResultMode::GroupedCount
        );
        assert_eq!(
            raw_result_mode(&json!({"return": {"type": "records", "include": ["fields"]}})).unwrap(),
            ResultMode::Records
        );
    }

    #[test]
    fn test_raw_result_mode_unknown() {
        for document in [
            json!({"datasetId": "x"}),
            json!({"return": "records"}),
            json!({"return": {"type": "sum"}}),
            json!({"return": {"type": "count", "groupBy": {"type": "metadataId"}}}),
        ] {
            assert!(matches!(
                raw_result_mode(&document),
                Err(ClientError::UnknownReturnType { .. })
            ));
        }
    }

    #[test]
    fn test_result_mode_of() {
        assert_eq!(result_mode_of(&Count::new().into()), ResultMode::Count);
        assert_eq!(
            result_mode_of(&Count::grouped(GroupBy::UniqueId).into()),
            ResultMode::GroupedCount
        );
        assert_eq!(result_mode_of(&Records::new().into()), ResultMode::Records);
    }

    #[test]
    fn test_schema_response_shapes() {
        let bare: SchemaResponse =
            serde_json::from_value(json!({"speed": {"type": "number", "signed": false}})).unwrap();
        assert!(matches!(bare, SchemaResponse::Bare(schema) if schema.contains("speed")));

        let wrapped: SchemaResponse =
            serde_json::from_value(json!({"fields": {"speed": {"type": "number"}}})).unwrap();
        assert!(matches!(wrapped, SchemaResponse::Wrapped { fields } if fields.contains("speed")));
    }
}
