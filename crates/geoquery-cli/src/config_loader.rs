//! Configuration loading utilities for CLI commands

use crate::cli::Cli;
use anyhow::{Context, Result};
use geoquery_core::config::{CliConfigOverrides, LayeredConfig};
use std::path::{Path, PathBuf};

/// Looked up in the working directory when --config is not given
pub const DEFAULT_CONFIG_FILE: &str = "geoquery.toml";

/// Resolve configuration: defaults, then file, then environment, then flags
pub fn load_config(cli: &Cli) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    if let Some(path) = config_path(cli.config.as_deref()) {
        config = config
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }

    let mut config = config.load_from_env();
    config.update_from_cli(overrides(cli));
    Ok(config)
}

/// An explicit path must exist; the default file is optional
fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.is_file().then_some(default)
        }
    }
}

fn overrides(cli: &Cli) -> CliConfigOverrides {
    CliConfigOverrides {
        base_url: cli.base_url.clone(),
        api_token: cli.token.clone(),
        query_timeout_secs: cli.timeout,
        // The flag can only switch progress on
        progress: cli.progress.then_some(true),
    }
}
