//! Command implementations

mod config;
mod history;
mod query;
mod raw;
mod schema;
mod truncate;

use crate::cli::{Cli, Commands};
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::progress::SpinnerObserver;
use anyhow::Result;
use geoquery_client::QueryClient;

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);

    match &cli.command {
        Commands::Count(args) => query::count(&cli, args, &output),
        Commands::Ids(args) => query::unique_ids(&cli, args, &output),
        Commands::Records(args) => query::records(&cli, args, &output),
        Commands::Raw(args) => raw::execute(&cli, args, &output),
        Commands::Schema(args) => schema::execute(&cli, args, &output),
        Commands::History(args) => history::execute(&cli, args, &output),
        Commands::Truncate(args) => truncate::execute(&cli, args, &output),
        Commands::Config => config::execute(&cli, &output),
    }
}

/// Resolve configuration and open an HTTP client
fn connect(cli: &Cli) -> Result<QueryClient> {
    let config = load_config(cli)?;
    tracing::debug!(
        base_url = %config.base_url.value,
        timeout_secs = config.query_timeout_secs.value,
        "Connecting to query service"
    );
    let client = QueryClient::from_config(&config)?;
    if config.progress.value {
        return Ok(client.with_observer(SpinnerObserver::new("Waiting for results")));
    }
    Ok(client)
}
