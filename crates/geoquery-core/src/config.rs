use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 60;

const REDACTED: &str = "<redacted>";

type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for talking to the query service
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub base_url: ConfigValue<String>,
    pub api_token: ConfigValue<String>,
    pub query_timeout_secs: ConfigValue<u64>,
    pub progress: ConfigValue<bool>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            base_url: ConfigValue::new(DEFAULT_BASE_URL.to_string(), ConfigSource::Default),
            api_token: ConfigValue::new(String::new(), ConfigSource::Default),
            query_timeout_secs: ConfigValue::new(DEFAULT_QUERY_TIMEOUT_SECS, ConfigSource::Default),
            progress: ConfigValue::new(false, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::ConfigInvalid {
            key: "file".to_string(),
            reason: format!("Failed to read config file: {}", e),
        })?;

        let file_config: FileConfig = toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid {
            key: "file".to_string(),
            reason: format!("Failed to parse TOML: {}", e),
        })?;

        if let Some(base_url) = file_config.base_url {
            self.base_url.update(base_url, ConfigSource::File);
        }

        if let Some(api_token) = file_config.api_token {
            self.api_token.update(api_token, ConfigSource::File);
        }

        if let Some(timeout) = file_config.query_timeout_secs {
            self.query_timeout_secs.update(timeout, ConfigSource::File);
        }

        if let Some(progress) = file_config.progress {
            self.progress.update(progress, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // GEOQUERY_BASE_URL
        if let Ok(base_url) = env::var("GEOQUERY_BASE_URL") {
            self.base_url.update(base_url, ConfigSource::Environment);
        }

        // GEOQUERY_API_TOKEN
        if let Ok(api_token) = env::var("GEOQUERY_API_TOKEN") {
            self.api_token.update(api_token, ConfigSource::Environment);
        }

        // GEOQUERY_QUERY_TIMEOUT
        if let Ok(timeout_str) = env::var("GEOQUERY_QUERY_TIMEOUT") {
            match timeout_str.parse::<u64>() {
                Ok(timeout) => self.query_timeout_secs.update(timeout, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOQUERY_QUERY_TIMEOUT value '{}': expected whole seconds",
                    timeout_str
                ),
            }
        }

        // GEOQUERY_PROGRESS
        if let Ok(progress_str) = env::var("GEOQUERY_PROGRESS") {
            match parse_bool(&progress_str) {
                Ok(progress) => self.progress.update(progress, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOQUERY_PROGRESS value '{}': expected true or false",
                    progress_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(base_url) = overrides.base_url {
            self.base_url.update(base_url, ConfigSource::Cli);
        }

        if let Some(api_token) = overrides.api_token {
            self.api_token.update(api_token, ConfigSource::Cli);
        }

        if let Some(timeout) = overrides.query_timeout_secs {
            self.query_timeout_secs.update(timeout, ConfigSource::Cli);
        }

        if let Some(progress) = overrides.progress {
            self.progress.update(progress, ConfigSource::Cli);
        }
    }

    /// The API token, or an error when no layer provided one
    pub fn require_token(&self) -> Result<&str> {
        if self.api_token.value.is_empty() {
            return Err(ConfigError::ConfigMissing {
                key: "api_token".to_string(),
            });
        }
        Ok(&self.api_token.value)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs.value)
    }

    /// Get all configuration values as a map for inspection
    ///
    /// The token is never rendered.
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert("base_url".to_string(), (self.base_url.value.clone(), self.base_url.source));

        let token = if self.api_token.value.is_empty() {
            "<unset>".to_string()
        } else {
            REDACTED.to_string()
        };
        map.insert("api_token".to_string(), (token, self.api_token.source));

        map.insert(
            "query_timeout_secs".to_string(),
            (format!("{}s", self.query_timeout_secs.value), self.query_timeout_secs.source),
        );

        map.insert("progress".to_string(), (self.progress.value.to_string(), self.progress.source));

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    base_url: Option<String>,
    api_token: Option<String>,
    query_timeout_secs: Option<u64>,
    progress: Option<bool>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub base_url: Option<String>,
    pub api_token: Option<String>,
    pub query_timeout_secs: Option<u64>,
    pub progress: Option<bool>,
}

/// Parse a boolean flag from string
pub fn parse_bool(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::ConfigInvalid {
            key: "progress".to_string(),
            reason: format!("Invalid boolean: {}. Use true or false", s),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.base_url.value, DEFAULT_BASE_URL);
        assert_eq!(config.base_url.source, ConfigSource::Default);
        assert_eq!(config.query_timeout_secs.value, 60);
        assert!(!config.progress.value);
        assert!(config.require_token().is_err());
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(100, ConfigSource::Default);

        // File should override default
        value.update(200, ConfigSource::File);
        assert_eq!(value.value, 200);
        assert_eq!(value.source, ConfigSource::File);

        // Environment should override file
        value.update(300, ConfigSource::Environment);
        assert_eq!(value.value, 300);
        assert_eq!(value.source, ConfigSource::Environment);

        // CLI should override environment
        value.update(400, ConfigSource::Cli);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);

        // Lower precedence should not override
        value.update(500, ConfigSource::File);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
base_url = "https://query.example.com"
api_token = "secret"
query_timeout_secs = 5
progress = true
"#
        )
        .unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

        assert_eq!(config.base_url.value, "https://query.example.com");
        assert_eq!(config.base_url.source, ConfigSource::File);
        assert_eq!(config.require_token().unwrap(), "secret");
        assert_eq!(config.query_timeout(), Duration::from_secs(5));
        assert!(config.progress.value);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = LayeredConfig::with_defaults();

        config.update_from_cli(CliConfigOverrides {
            base_url: Some("http://10.0.0.1:9000".to_string()),
            query_timeout_secs: Some(1),
            ..Default::default()
        });

        assert_eq!(config.base_url.value, "http://10.0.0.1:9000");
        assert_eq!(config.base_url.source, ConfigSource::Cli);
        assert_eq!(config.query_timeout_secs.value, 1);
        assert_eq!(config.api_token.source, ConfigSource::Default);
        assert_eq!(config.progress.source, ConfigSource::Default);
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true").unwrap());
        assert!(parse_bool("ON").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_inspection_map_redacts_token() {
        let mut config = LayeredConfig::with_defaults();
        let (token, _) = &config.to_inspection_map()["api_token"];
        assert_eq!(token, "<unset>");

        config.update_from_cli(CliConfigOverrides {
            api_token: Some("very-secret".to_string()),
            ..Default::default()
        });
        let map = config.to_inspection_map();
        let (token, source) = &map["api_token"];
        assert_eq!(token, REDACTED);
        assert_eq!(*source, ConfigSource::Cli);
        assert!(map.values().all(|(value, _)| !value.contains("very-secret")));
    }
}
