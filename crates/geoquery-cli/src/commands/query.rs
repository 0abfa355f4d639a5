//! Count, ids and records commands

use crate::cli::{Cli, QueryArgs, RecordsArgs};
use crate::dry_run::{display_planned_request, PlannedRequest};
use crate::output::OutputWriter;
use crate::output_types::{CountOutput, RecordRow, UniqueIdCountRow};
use crate::parse;
use anyhow::Result;
use geoquery_client::QUERY_PATH;
use geoquery_core::{Count, FilterField, GroupBy, Only, QueryDocument, Records, ReturnModel};
use geoquery_stream::progress::with_thousands;
use geoquery_stream::QueryResult;

pub fn count(cli: &Cli, args: &QueryArgs, output: &OutputWriter) -> Result<()> {
    run(cli, args, Count::new().into(), None, output)
}

pub fn unique_ids(cli: &Cli, args: &QueryArgs, output: &OutputWriter) -> Result<()> {
    run(cli, args, Count::grouped(GroupBy::UniqueId).into(), None, output)
}

pub fn records(cli: &Cli, args: &RecordsArgs, output: &OutputWriter) -> Result<()> {
    let model = match parse::include(&args.include)? {
        Some(include) => Records::with_include(include)?,
        None => Records::new(),
    };
    let only = parse::only(args.only.as_deref())?;
    run(cli, &args.query, model.into(), only, output)
}

fn run(
    cli: &Cli,
    args: &QueryArgs,
    model: ReturnModel,
    only: Option<Only>,
    output: &OutputWriter,
) -> Result<()> {
    let mut filters = parse::query_filters(args)?;
    filters.only = only;

    if args.dry_run && !args.check_schema {
        let document = QueryDocument::with_filters(args.dataset.as_str(), model, filters)?;
        return display_planned_request(output, &PlannedRequest::post(QUERY_PATH, document.build()?));
    }

    let mut client = super::connect(cli)?;

    let document = if args.check_schema {
        let schema = client.fetch_schema(&args.dataset)?;
        // Nullability is declared by the schema, not on the command line
        filters.filter_fields = filters.filter_fields.map(|fields| {
            fields
                .into_iter()
                .map(|field| {
                    let nullable = schema.get(field.name()).is_some_and(|f| f.is_nullable());
                    field.nullable(nullable)
                })
                .collect::<Vec<FilterField>>()
        });
        let mut document = QueryDocument::with_filters(args.dataset.as_str(), model, filters)?;
        document.set_schema(Some(schema))?;
        document
    } else {
        QueryDocument::with_filters(args.dataset.as_str(), model, filters)?
    };

    if args.dry_run {
        return display_planned_request(output, &PlannedRequest::post(QUERY_PATH, document.build()?));
    }

    let result = client.execute(&document)?;
    render(output, &args.dataset, result)
}

/// Print any query result
pub fn render(output: &OutputWriter, dataset_id: &str, result: QueryResult) -> Result<()> {
    match result {
        QueryResult::Count(count) => {
            if output.is_json() {
                output.result(CountOutput {
                    dataset_id: dataset_id.to_string(),
                    count,
                })
            } else {
                output.success(format!("{} matching records in {}", with_thousands(count), dataset_id));
                Ok(())
            }
        }
        QueryResult::GroupedCount(counts) => {
            let rows = UniqueIdCountRow::sorted(counts);
            if !output.is_json() {
                output.info(format!("{} unique ids", with_thousands(rows.len() as u64)));
            }
            output.table(rows)
        }
        QueryResult::Records(records) => {
            if output.is_json() {
                return output.result(records);
            }
            output.info(format!("{} records", with_thousands(records.len() as u64)));
            output.table(records.iter().map(RecordRow::from).collect())
        }
    }
}
