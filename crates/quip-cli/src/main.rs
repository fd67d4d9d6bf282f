//! Quip CLI - Command-line interface for a synced quote collection
//!
//! Show a random quote, add and import quotes, and sync with a remote
//! collection where the server wins every conflict.

mod cli;
mod cli_config;
mod commands;
mod error;


use clap::Parser;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, SyncCommands};
use crate::commands::add::run_add;
use crate::commands::common::resolve_db_path;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::export::{run_export, run_import};
use crate::commands::list::{run_categories, run_list};
use crate::commands::random::{run_filter, run_random};
use crate::commands::sync::{run_sync, run_sync_watch};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let quip_directive: Directive = "quip=info"
        .parse()
        .map_err(|error| CliError::Config(format!("Invalid log directive: {error}")))?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(quip_directive))
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path)?;

    match cli.command {
        Some(Commands::Random { category }) => run_random(category.as_deref(), &db_path).await?,
        Some(Commands::Add { text, category }) => run_add(&text, &category, &db_path).await?,
        Some(Commands::List { category, json }) => {
            run_list(category.as_deref(), json, &db_path).await?;
        }
        Some(Commands::Categories { json }) => run_categories(json, &db_path).await?,
        Some(Commands::Filter { category, clear }) => {
            run_filter(category.as_deref(), clear, &db_path).await?;
        }
        Some(Commands::Export { output }) => run_export(output.as_deref(), &db_path).await?,
        Some(Commands::Import { path }) => run_import(&path, &db_path).await?,
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
        Some(Commands::Sync {
            command: Some(SyncCommands::Watch { interval }),
            ..
        }) => run_sync_watch(interval, &db_path).await?,
        Some(Commands::Sync {
            command: None,
            keep_local,
            json,
        }) => run_sync(keep_local, json, &db_path).await?,
        Some(Commands::Config { command }) => run_config(command)?,
        None => run_random(None, &db_path).await?,
    }

    Ok(())
}
