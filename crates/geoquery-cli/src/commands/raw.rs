//! Raw command: submit a prepared document as is

use crate::cli::{Cli, RawArgs};
use crate::dry_run::{display_planned_request, PlannedRequest};
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use geoquery_client::{raw_result_mode, QUERY_PATH};
use serde_json::Value;
use std::fs;

pub fn execute(cli: &Cli, args: &RawArgs, output: &OutputWriter) -> Result<()> {
    let text = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read query document {}", args.file.display()))?;
    let document: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", args.file.display()))?;

    // Reject unknown return shapes before anything is sent or printed
    raw_result_mode(&document)?;

    if args.dry_run {
        return display_planned_request(output, &PlannedRequest::post(QUERY_PATH, document));
    }

    let dataset_id = document
        .get("datasetId")
        .and_then(Value::as_str)
        .unwrap_or("dataset")
        .to_string();

    let mut client = super::connect(cli)?;
    let result = client.raw_request(document)?;
    super::query::render(output, &dataset_id, result)
}
