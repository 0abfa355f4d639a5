use console::style;
use geoquery_client::ClientError;
use geoquery_core::{ConfigError, ValidationError};
use geoquery_stream::ProtocolError;
use std::fmt;

/// Enhanced error type with suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Create error for a missing API token
pub fn missing_token() -> CliError {
    CliError::new("No API token configured")
        .with_context("Every request to the query service is authenticated with a bearer token.")
        .with_suggestion("Pass it on the command line: --token <TOKEN>")
        .with_suggestion("Or set GEOQUERY_API_TOKEN")
        .with_suggestion("Or add api_token to geoquery.toml")
        .with_help("Run: geoquery config")
}

/// Create error for a query rejected before submission
pub fn invalid_query(error: &ValidationError) -> CliError {
    CliError::new("Invalid query")
        .with_context(format!("The query was not sent.\n\nReason: {}", error))
        .with_suggestion("Filter fields are written name:kind:op:value, e.g. speed:unsigned-number:gte:10")
        .with_suggestion("Ranges (between, outside) take two integers: low..high")
        .with_help("Run: geoquery count --help")
}

/// Create error for a result stream that could not be trusted
pub fn stream_failed(error: &ProtocolError) -> CliError {
    let err = CliError::new("Query did not complete").with_context(format!("Reason: {}", error));
    if error.is_transient() {
        err.with_suggestion("The query may succeed if run again")
            .with_suggestion("Increase the timeout for large results: --timeout <SECS>")
    } else {
        err.with_suggestion("The result stream broke the protocol; partial results were discarded")
    }
}

/// Create error for a non-success HTTP response
pub fn request_failed(status: u16, body: &str) -> CliError {
    let err = CliError::new(format!("Query service returned HTTP {}", status));
    let err = if body.is_empty() {
        err
    } else {
        err.with_context(format!("Response: {}", body))
    };
    match status {
        401 | 403 => err
            .with_suggestion("Check that the API token is valid for this dataset")
            .with_help("Run: geoquery config"),
        404 => err.with_suggestion("Check the dataset id and --base-url"),
        _ => err,
    }
}

/// Create error for invalid configuration
pub fn invalid_config(key: &str, reason: &str) -> CliError {
    CliError::new(format!("Invalid configuration: {}", key))
        .with_context(format!("Configuration value is invalid.\n\nReason: {}", reason))
        .with_suggestion("Check geoquery.toml for syntax errors")
        .with_help("Run: geoquery config")
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    if let Some(client_error) = error.downcast_ref::<ClientError>() {
        return match client_error {
            ClientError::Validation(e) => invalid_query(e),
            ClientError::Protocol(e) => stream_failed(e),
            ClientError::Config(e) => from_config_error(e),
            ClientError::Status { status, body } => request_failed(*status, body),
            ClientError::UnknownReturnType { .. } => CliError::new(client_error.to_string())
                .with_suggestion("Declare \"return\" as \"count\", {\"type\": \"count\"} or {\"type\": \"records\"}")
                .with_suggestion("Grouped counts use {\"type\": \"count\", \"groupBy\": {\"type\": \"uniqueId\"}}"),
            other => CliError::new(other.to_string()).with_suggestion("Check --base-url and network access"),
        };
    }
    if let Some(e) = error.downcast_ref::<ValidationError>() {
        return invalid_query(e);
    }
    if let Some(e) = error.downcast_ref::<ConfigError>() {
        return from_config_error(e);
    }

    let message = format!("{:#}", error);
    if message.contains("No such file or directory") {
        CliError::new("File not found")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check the file path and try again")
    } else {
        CliError::new(message)
    }
}

fn from_config_error(error: &ConfigError) -> CliError {
    match error {
        ConfigError::ConfigMissing { key } if key == "api_token" => missing_token(),
        ConfigError::ConfigInvalid { key, reason } => invalid_config(key, reason),
        other => CliError::new(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_maps_to_guidance() {
        let error = anyhow::Error::from(ClientError::from(ConfigError::ConfigMissing {
            key: "api_token".to_string(),
        }));
        let cli_error = from_anyhow(error);
        assert_eq!(cli_error.message, "No API token configured");
        assert!(!cli_error.suggestions.is_empty());
    }

    #[test]
    fn test_transient_stream_errors_suggest_retry() {
        let cli_error = stream_failed(&ProtocolError::NoFinishMessage);
        assert!(cli_error.suggestions[0].contains("run again"));

        let cli_error = stream_failed(&ProtocolError::EventsMissed {
            received: 1,
            declared: 3,
        });
        assert!(cli_error.suggestions[0].contains("discarded"));
    }

    #[test]
    fn test_validation_error_downcast() {
        let cli_error = from_anyhow(anyhow::Error::from(ValidationError::BBoxUndefined));
        assert_eq!(cli_error.message, "Invalid query");
        assert!(cli_error.context.unwrap().contains("BoundingBox is undefined"));
    }
}
