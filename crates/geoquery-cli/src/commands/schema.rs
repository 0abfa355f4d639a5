use crate::cli::{Cli, SchemaArgs};
use crate::output::OutputWriter;
use crate::output_types::SchemaFieldRow;
use anyhow::Result;

pub fn execute(cli: &Cli, args: &SchemaArgs, output: &OutputWriter) -> Result<()> {
    let client = super::connect(cli)?;
    let schema = client.fetch_schema(&args.dataset)?;

    if output.is_json() {
        return output.result(schema);
    }

    output.section(format!("Schema of {}", args.dataset));
    output.table(SchemaFieldRow::from_schema(&schema))
}
