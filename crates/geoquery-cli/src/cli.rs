use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// GeoQuery - Spatio-temporal queries against a streaming query service
#[derive(Parser, Debug)]
#[command(name = "geoquery")]
#[command(about = "Spatio-temporal queries against a streaming query service", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (TOML); defaults to ./geoquery.toml when present
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Query service root URL
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// API token sent as a bearer token
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Show a spinner while results stream in
    #[arg(long, global = true)]
    pub progress: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count the records matching the filters
    Count(QueryArgs),

    /// Count the matching records per unique id
    Ids(QueryArgs),

    /// Fetch the matching records
    Records(RecordsArgs),

    /// Submit a query document read from a JSON file
    Raw(RawArgs),

    /// Show the filter field schema of a dataset
    Schema(SchemaArgs),

    /// List recent queries
    History(HistoryArgs),

    /// Remove every record from a dataset
    Truncate(TruncateArgs),

    /// Show the resolved configuration and where each value came from
    Config,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Dataset to query
    #[arg(long, short = 'd')]
    pub dataset: String,

    /// Restrict to these unique ids (repeatable)
    #[arg(long = "uid", value_name = "ID")]
    pub uids: Vec<String>,

    /// Bounding box as minLon,minLat,maxLon,maxLat
    #[arg(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        num_args = 1,
        conflicts_with = "polygon",
        value_name = "BOUNDS"
    )]
    pub bbox: Option<Vec<f64>>,

    /// GeoJSON Polygon file
    #[arg(long, value_name = "PATH")]
    pub polygon: Option<PathBuf>,

    /// Earliest time (ISO 8601 with offset)
    #[arg(long, value_name = "TIME")]
    pub min_time: Option<String>,

    /// Latest time (ISO 8601 with offset)
    #[arg(long, value_name = "TIME")]
    pub max_time: Option<String>,

    /// Filter field as name:kind:op:value, e.g. speed:unsigned-number:between:10..20 (repeatable)
    #[arg(long = "field", value_name = "FIELD")]
    pub fields: Vec<String>,

    /// Validate filter fields against the dataset schema before submitting
    #[arg(long)]
    pub check_schema: bool,

    /// Print the query document without submitting it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct RecordsArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Only the newest or oldest record per unique id
    #[arg(long, value_name = "newest|oldest")]
    pub only: Option<String>,

    /// Extra columns to return: fields, metadataId (repeatable)
    #[arg(long, value_name = "COLUMN")]
    pub include: Vec<String>,
}

#[derive(Args, Debug)]
pub struct RawArgs {
    /// JSON file holding the complete query document
    pub file: PathBuf,

    /// Print the document without submitting it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Dataset whose schema to show
    pub dataset: String,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Only queries against this dataset
    #[arg(long, short = 'd')]
    pub dataset: Option<String>,

    /// Only queries made by this identity (tenant admins)
    #[arg(long)]
    pub identity: Option<String>,

    /// Only queries made before this time (ISO 8601)
    #[arg(long, value_name = "TIME")]
    pub before: Option<String>,

    /// Number of queries to list (at most 500)
    #[arg(long, default_value = "100")]
    pub page_size: u32,
}

#[derive(Args, Debug)]
pub struct TruncateArgs {
    /// Dataset to truncate
    pub dataset: String,

    /// Confirm the truncation
    #[arg(long)]
    pub yes: bool,

    /// Show the request without sending it
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count_flags() {
        let cli = Cli::try_parse_from([
            "geoquery",
            "count",
            "--dataset",
            "ds-1",
            "--bbox",
            "-1.5,50,1.5,52",
            "--uid",
            "a",
            "--uid",
            "7",
            "--field",
            "speed:unsigned-number:gt:10",
            "--dry-run",
        ])
        .unwrap();

        let Commands::Count(args) = cli.command else {
            panic!("expected count");
        };
        assert_eq!(args.dataset, "ds-1");
        assert_eq!(args.bbox, Some(vec![-1.5, 50.0, 1.5, 52.0]));
        assert_eq!(args.uids, vec!["a", "7"]);
        assert_eq!(args.fields.len(), 1);
        assert!(args.dry_run);
    }

    #[test]
    fn test_bbox_conflicts_with_polygon() {
        let result = Cli::try_parse_from([
            "geoquery",
            "count",
            "-d",
            "ds-1",
            "--bbox",
            "0,0,1,1",
            "--polygon",
            "area.geojson",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["geoquery", "schema", "ds-1", "--json", "--token", "abc"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.token.as_deref(), Some("abc"));
    }
}
