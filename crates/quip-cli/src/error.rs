use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] quip_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("No quotes match category '{0}'")]
    NoMatchingQuote(String),
    #[error("The collection is empty. Add one with `quip add <text> --category <name>`.")]
    EmptyCollection,
    #[error("Failed to read {path}: {source}")]
    ReadInput { path: String, source: io::Error },
}
