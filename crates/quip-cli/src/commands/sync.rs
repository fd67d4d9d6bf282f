use std::path::Path;
use std::time::Duration;

use quip_core::sync::SyncReport;
use serde::Serialize;

use crate::commands::common::{format_conflict_lines, format_sync_timestamp, open_sync_book};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct SyncOutput<'a> {
    pub summary: String,
    pub finished_at_iso: String,
    pub reverted: usize,
    #[serde(flatten)]
    pub report: &'a SyncReport,
}

pub async fn run_sync(keep_local: bool, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let (book, _) = open_sync_book(db_path).await?;
    let report = book.run_sync_cycle().await?;

    let mut reverted = 0;
    if keep_local {
        for conflict in &report.conflicts {
            book.revert_to_local(conflict).await?;
            reverted += 1;
        }
    }

    if as_json {
        let output = SyncOutput {
            summary: report.summary(),
            finished_at_iso: format_sync_timestamp(report.finished_at),
            reverted,
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", report.summary());
    for line in format_conflict_lines(&report.conflicts) {
        println!("{line}");
    }
    if reverted > 0 {
        println!("Restored local category for {reverted} quote(s)");
    }
    Ok(())
}

pub async fn run_sync_watch(interval_secs: Option<u64>, db_path: &Path) -> Result<(), CliError> {
    let (book, config) = open_sync_book(db_path).await?;
    let interval = match interval_secs {
        Some(0) => {
            return Err(CliError::Config(
                "sync interval must be at least 1 second".to_string(),
            ))
        }
        Some(secs) => Duration::from_secs(secs),
        None => config.sync.interval(),
    };

    book.start_auto_sync(interval)?;
    println!(
        "Syncing with {} every {}s. Press Ctrl-C to stop.",
        config.sync.endpoint,
        interval.as_secs()
    );

    tokio::signal::ctrl_c().await?;
    book.stop_auto_sync();
    if let Some(finished_at) = book.last_synced_at() {
        println!("Last successful sync at {}", format_sync_timestamp(finished_at));
    }
    Ok(())
}
