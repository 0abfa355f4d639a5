use crate::output::OutputWriter;
use serde::Serialize;
use serde_json::Value;

/// A request that would have been sent
#[derive(Debug, Clone, Serialize)]
pub struct PlannedRequest {
    pub method: Method,
    pub path: String,
    pub body: Value,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Post,
}

impl PlannedRequest {
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body,
        }
    }
}

/// Display a planned request in dry-run mode
pub fn display_planned_request(output: &OutputWriter, request: &PlannedRequest) -> anyhow::Result<()> {
    if output.is_json() {
        output.result(serde_json::json!({
            "dry_run": true,
            "request": request,
        }))
    } else {
        output.section("Planned Request (Dry Run)");
        output.kv("Method", format!("{:?}", request.method).to_uppercase());
        output.kv("Path", &request.path);
        output.section("Body");
        output.data(&request.body)?;
        output.info("Nothing was sent. Run without --dry-run to submit.");
        Ok(())
    }
}
