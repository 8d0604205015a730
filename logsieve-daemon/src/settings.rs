//! Effective configuration resolution.
//!
//! Precedence: CLI flags > environment variables > config file > defaults.

use anyhow::Result;

use logsieve_core::config::LogsieveConfig;

use crate::cli::DaemonCli;

/// Build the effective configuration for this run.
///
/// # Errors
///
/// - The explicitly given config file is missing or invalid
/// - The merged configuration fails validation
pub async fn resolve_config(cli: &DaemonCli) -> Result<LogsieveConfig> {
    let mut config = match &cli.config {
        Some(path) => LogsieveConfig::load(path).await?,
        None => {
            let mut config = LogsieveConfig::default();
            config.apply_env_overrides();
            config
        }
    };

    apply_cli_overrides(&mut config, cli);
    config.validate()?;
    Ok(config)
}

/// Apply command-line overrides on top of a loaded configuration.
pub fn apply_cli_overrides(config: &mut LogsieveConfig, cli: &DaemonCli) {
    if !cli.sources.is_empty() {
        config.filter.sources = cli
            .sources
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
    }
    if let Some(secs) = cli.refresh_interval_secs {
        config.filter.refresh_interval_secs = secs;
    }
    if let Some(mode) = &cli.level_mode {
        config.filter.level_mode = mode.to_ascii_lowercase();
    }
    if let Some(level) = &cli.log_level {
        config.general.log_level = level.to_ascii_lowercase();
    }
    if let Some(format) = &cli.log_format {
        config.general.log_format = format.to_ascii_lowercase();
    }
}
