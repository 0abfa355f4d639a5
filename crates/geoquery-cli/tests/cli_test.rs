//! Integration tests for the geoquery binary
//!
//! Nothing here reaches a query service: every test either stops at --dry-run
//! or fails before a request is made.

use std::path::PathBuf;
use std::process::{Command, Output};

fn geoquery_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_geoquery"))
}

/// Run in an empty directory with no GEOQUERY_* variables set
fn run(args: &[&str]) -> Output {
    let dir = tempfile::tempdir().unwrap();
    Command::new(geoquery_bin())
        .args(args)
        .current_dir(dir.path())
        .env_remove("GEOQUERY_BASE_URL")
        .env_remove("GEOQUERY_API_TOKEN")
        .env_remove("GEOQUERY_QUERY_TIMEOUT")
        .env_remove("GEOQUERY_PROGRESS")
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute command")
}

#[test]
fn test_count_dry_run_prints_document() {
    let output = run(&[
        "count",
        "--dataset",
        "ds-1",
        "--bbox",
        "-1,50,1,52",
        "--min-time",
        "2023-01-01T00:00:00Z",
        "--field",
        "speed:unsigned-number:between:10..20",
        "--dry-run",
        "--json",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Output should be valid JSON");
    let request = &parsed["data"]["request"];
    assert_eq!(request["method"], "POST");
    assert_eq!(request["path"], "v1/query");

    let body = &request["body"];
    assert_eq!(body["datasetId"], "ds-1");
    assert_eq!(body["return"], serde_json::json!({"type": "count"}));
    assert_eq!(body["filters"]["geo"]["type"], "BoundingBox");
    assert_eq!(body["filters"]["fields"]["speed"]["between"], serde_json::json!([10, 20]));
    assert_eq!(body["filters"]["time"]["minTime"], "2023-01-01T00:00:00+00:00");
}

#[test]
fn test_records_dry_run_with_include_and_only() {
    let output = run(&[
        "records",
        "-d",
        "ds-1",
        "--include",
        "fields",
        "--only",
        "newest",
        "--dry-run",
        "--json",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let body = &parsed["data"]["request"]["body"];
    assert_eq!(body["return"], serde_json::json!({"type": "records", "include": ["fields"]}));
    assert_eq!(body["filters"]["only"], "newest");
}

#[test]
fn test_invalid_query_is_rejected_before_sending() {
    let output = run(&["count", "-d", "ds-1", "--bbox", "1,50,-1,52", "--dry-run"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid query"));

    let output = run(&["count", "-d", "ds-1", "--field", "source:ip:gt:10.0.0.1", "--dry-run"]);
    assert!(!output.status.success());
}

#[test]
fn test_missing_token_fails_without_request() {
    let output = run(&["count", "-d", "ds-1"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No API token configured"));
}

#[test]
fn test_raw_dry_run_checks_return_shape() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.json");
    let bad = dir.path().join("bad.json");
    std::fs::write(&good, r#"{"datasetId": "ds-1", "return": "count"}"#).unwrap();
    std::fs::write(&bad, r#"{"datasetId": "ds-1", "return": {"type": "histogram"}}"#).unwrap();

    let output = run(&["raw", good.to_str().unwrap(), "--dry-run", "--json"]);
    assert!(output.status.success());

    let output = run(&["raw", bad.to_str().unwrap(), "--dry-run"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown return type"));
}

#[test]
fn test_config_never_shows_token() {
    let output = run(&["config", "--token", "super-secret", "--json"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("super-secret"));

    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let rows = parsed["data"].as_array().unwrap();
    let token = rows.iter().find(|row| row["key"] == "api_token").unwrap();
    assert_eq!(token["value"], "<redacted>");
    assert_eq!(token["source"], "Cli");
}

#[test]
fn test_truncate_requires_confirmation() {
    let output = run(&["truncate", "ds-1", "--token", "t"]);
    assert!(!output.status.success());

    let output = run(&["truncate", "ds-1", "--dry-run", "--json"]);
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        parsed["data"]["request"]["body"],
        serde_json::json!({"datasetId": "ds-1", "operation": "truncate"})
    );
}
