//! History command: recent queries from the instrumentation endpoint

use crate::cli::{Cli, HistoryArgs};
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use geoquery_client::{InstrumentationFilter, MAX_PAGE_SIZE};

pub fn execute(cli: &Cli, args: &HistoryArgs, output: &OutputWriter) -> Result<()> {
    let mut filter = InstrumentationFilter::new().page_size(args.page_size);
    if let Some(dataset) = &args.dataset {
        filter = filter.dataset(dataset.as_str());
    }
    if let Some(identity) = &args.identity {
        filter = filter.identity(identity.as_str());
    }
    if let Some(before) = &args.before {
        let before = DateTime::parse_from_rfc3339(before)
            .with_context(|| format!("'{}' is not an ISO 8601 timestamp", before))?;
        filter = filter.before(before.with_timezone(&Utc));
    }

    if args.page_size > MAX_PAGE_SIZE {
        output.warning(format!("Page size capped at {}", MAX_PAGE_SIZE));
    }

    let client = super::connect(cli)?;
    let queries = client.instrumentation(&filter)?;

    if output.is_json() {
        return output.result(queries);
    }

    let count = queries.as_array().map_or(0, Vec::len);
    output.section(format!("Recent Queries ({})", count));
    output.data(&queries)
}
