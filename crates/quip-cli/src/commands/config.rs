use std::path::Path;

use quip_core::config::SyncSettings;
use quip_core::util::non_blank;

use crate::cli::ConfigCommands;
use crate::cli_config::{default_config_path, CliConfig, SYNC_ENDPOINT_ENV};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            endpoint,
            interval,
            timeout,
        } => run_config_init(endpoint, interval, timeout),
        ConfigCommands::Show => run_config_show(),
    }
}

pub fn run_config_init(
    endpoint: Option<String>,
    interval: Option<u64>,
    timeout: Option<u64>,
) -> Result<(), CliError> {
    let mut config = CliConfig::load().map_err(CliError::Config)?;
    config.sync = merge_sync_settings(&config.sync, endpoint, interval, timeout)?;

    let path = config.save().map_err(CliError::Config)?;
    println!("Sync configuration saved to {}", path.display());
    print_settings(&config.sync);
    Ok(())
}

fn run_config_show() -> Result<(), CliError> {
    let path = default_config_path().map_err(CliError::Config)?;
    let config = CliConfig::load_from_path(&path).map_err(CliError::Config)?;
    let effective = config.effective_sync_settings().map_err(CliError::Config)?;

    println!("config:   {}", describe_path(&path));
    print_settings(&effective);
    if effective.endpoint != config.sync.endpoint {
        println!("          (endpoint overridden by {SYNC_ENDPOINT_ENV})");
    }
    Ok(())
}

/// Explicit values win over the existing settings; the result is validated
pub fn merge_sync_settings(
    existing: &SyncSettings,
    endpoint: Option<String>,
    interval: Option<u64>,
    timeout: Option<u64>,
) -> Result<SyncSettings, CliError> {
    let merged = SyncSettings {
        endpoint: endpoint
            .as_deref()
            .and_then(non_blank)
            .unwrap_or_else(|| existing.endpoint.clone()),
        interval_secs: interval.unwrap_or(existing.interval_secs),
        timeout_secs: timeout.unwrap_or(existing.timeout_secs),
    };
    Ok(merged.validated()?)
}

fn print_settings(settings: &SyncSettings) {
    println!("endpoint: {}", settings.endpoint);
    println!("interval: {}s", settings.interval_secs);
    println!("timeout:  {}s", settings.timeout_secs);
}

fn describe_path(path: &Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not created yet, using defaults)", path.display())
    }
}
