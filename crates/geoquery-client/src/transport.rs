//! Transport port and its HTTP adapter

use std::io::Read;
use std::time::Duration;

use geoquery_core::config::LayeredConfig;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde_json::Value;
use tracing::{debug, error};

use crate::error::{ClientError, Result};

const EVENT_STREAM: &str = "text/event-stream";
const REDACTED_AUTHORIZATION: &str = "Bearer XXX";

/// Authenticated access to the query service
///
/// Paths are relative to the service root, e.g. `v1/query`.
pub trait Transport: Send + Sync {
    /// POST a JSON document and return the event-stream body unread
    fn post_stream(&self, path: &str, body: &Value) -> Result<Box<dyn Read + Send>>;

    /// GET a JSON response
    fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value>;

    /// POST a JSON document and return the JSON response
    fn post_json(&self, path: &str, body: &Value) -> Result<Value>;
}

/// Blocking reqwest transport with bearer authentication
pub struct HttpTransport {
    /// Service root (e.g., "http://localhost:8080")
    base_url: String,

    token: String,

    client: Client,
}

impl HttpTransport {
    /// Create a transport; `timeout` bounds every request including the stream read
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        })
    }

    /// Create from resolved configuration; fails when no token is configured
    pub fn from_config(config: &LayeredConfig) -> Result<Self> {
        let token = config.require_token()?;
        Self::new(config.base_url.value.clone(), token, config.query_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn send(&self, request: RequestBuilder, url: &str, payload: Option<&Value>) -> Result<Response> {
        debug!(url, authorization = REDACTED_AUTHORIZATION, payload = ?payload, "Sending request");

        let response = request.bearer_auth(&self.token).send()?;
        let status = response.status();
        if status.is_success() {
            debug!(url, status = status.as_u16(), "Request succeeded");
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        error!(
            url,
            status = status.as_u16(),
            authorization = REDACTED_AUTHORIZATION,
            payload = ?payload,
            body = %body,
            "Request failed"
        );
        Err(ClientError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

impl Transport for HttpTransport {
    fn post_stream(&self, path: &str, body: &Value) -> Result<Box<dyn Read + Send>> {
        let url = self.url(path);
        let request = self.client.post(&url).header(ACCEPT, EVENT_STREAM).json(body);
        let response = self.send(request, &url, Some(body))?;
        Ok(Box::new(response))
    }

    fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = self.url(path);
        debug!(url, params = ?params, "Query parameters");
        let request = self.client.get(&url).query(params);
        let response = self.send(request, &url, None)?;
        Ok(response.json()?)
    }

    fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.url(path);
        let request = self.client.post(&url).json(body);
        let response = self.send(request, &url, Some(body))?;
        Ok(response.json()?)
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field(AUTHORIZATION.as_str(), &REDACTED_AUTHORIZATION)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoquery_core::config::CliConfigOverrides;

    #[test]
    fn test_url_joining() {
        let transport = HttpTransport::new("http://example.com/api/", "t", Duration::from_secs(5)).unwrap();
        assert_eq!(transport.base_url(), "http://example.com/api");
        assert_eq!(transport.url("v1/query"), "http://example.com/api/v1/query");
        assert_eq!(transport.url("/v1/query"), "http://example.com/api/v1/query");
    }

    #[test]
    fn test_from_config_requires_token() {
        let config = LayeredConfig::with_defaults();
        assert!(matches!(
            HttpTransport::from_config(&config),
            Err(ClientError::Config(_))
        ));

        let mut config = LayeredConfig::with_defaults();
        config.update_from_cli(CliConfigOverrides {
            api_token: Some("secret".to_string()),
            ..Default::default()
        });
        let transport = HttpTransport::from_config(&config).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_debug_hides_token() {
        let transport = HttpTransport::new("http://localhost", "secret", Duration::from_secs(5)).unwrap();
        let rendered = format!("{:?}", transport);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("Bearer XXX"));
    }
}
