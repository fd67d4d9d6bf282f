use std::env;
use std::path::{Path, PathBuf};

use chrono::Utc;
use quip_core::models::Conflict;
use quip_core::{QuoteBook, QuoteRecord};
use serde::Serialize;

use crate::cli_config::CliConfig;
use crate::error::CliError;

pub const DB_PATH_ENV: &str = "QUIP_DB_PATH";

#[derive(Debug, Serialize)]
pub struct QuoteListItem {
    pub id: Option<String>,
    pub text: String,
    pub category: String,
    pub updated_at: i64,
    pub relative_time: String,
}

pub fn quote_to_list_item(quote: &QuoteRecord) -> QuoteListItem {
    let now_ms = Utc::now().timestamp_millis();
    QuoteListItem {
        id: quote.id.as_ref().map(ToString::to_string),
        text: quote.text.clone(),
        category: quote.category.clone(),
        updated_at: quote.updated_at,
        relative_time: format_relative_time(quote.updated_at, now_ms),
    }
}

pub fn format_quote_lines(quotes: &[QuoteRecord]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    quotes
        .iter()
        .map(|quote| {
            let id = quote
                .id
                .as_ref()
                .map_or_else(|| "-".to_string(), ToString::to_string);
            let short_id = id.chars().take(13).collect::<String>();
            let preview = quote_preview(quote, 50);
            let relative_time = format_relative_time(quote.updated_at, now_ms);
            format!(
                "{short_id:<13}  {:<14}  {preview:<50}  {relative_time}",
                quote.category
            )
        })
        .collect()
}

/// A quote the way `quip random` shows it
pub fn format_quote(quote: &QuoteRecord) -> String {
    format!("\"{}\"\n  - {}", quote.text, quote.category)
}

pub fn format_conflict_lines(conflicts: &[Conflict]) -> Vec<String> {
    conflicts
        .iter()
        .map(|conflict| format!("  conflict  {}", conflict.describe()))
        .collect()
}

pub fn quote_preview(quote: &QuoteRecord, max_chars: usize) -> String {
    let collapsed = quote.text.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_sync_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path.or_else(|| env::var_os(DB_PATH_ENV).map(PathBuf::from)) {
        return Ok(path);
    }
    default_db_path()
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("quip").join("quip.db"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}

/// Open the local collection without sync
pub async fn open_book(db_path: &Path) -> Result<QuoteBook, CliError> {
    Ok(QuoteBook::open_path(db_path).await?)
}

/// Open the local collection with the configured remote attached
pub async fn open_sync_book(db_path: &Path) -> Result<(QuoteBook, CliConfig), CliError> {
    let config = CliConfig::load().map_err(CliError::Config)?;
    let settings = config
        .effective_sync_settings()
        .map_err(CliError::Config)?;
    let book = open_book(db_path).await?.with_sync_settings(&settings)?;
    Ok((book, CliConfig { sync: settings, ..config }))
}
