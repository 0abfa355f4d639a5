use crate::cli::{Cli, TruncateArgs};
use crate::dry_run::{display_planned_request, PlannedRequest};
use crate::output::OutputWriter;
use anyhow::{bail, Result};
use geoquery_client::{ManageOperation, MANAGE_PATH};
use serde_json::json;

pub fn execute(cli: &Cli, args: &TruncateArgs, output: &OutputWriter) -> Result<()> {
    let operation = ManageOperation::Truncate;

    if args.dry_run {
        let body = json!({ "datasetId": args.dataset, "operation": operation.as_str() });
        return display_planned_request(output, &PlannedRequest::post(MANAGE_PATH, body));
    }

    if !args.yes {
        output.warning(format!("This removes every record from {}", args.dataset));
        bail!("Refusing to truncate without --yes");
    }

    let client = super::connect(cli)?;
    let response = client.manage(&args.dataset, operation)?;

    if output.is_json() {
        return output.result(response);
    }
    output.success(format!("Truncated {}", args.dataset));
    Ok(())
}
