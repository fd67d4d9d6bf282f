//! Client-facing quote collection service used by every front end.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use tokio::sync::Mutex;

use crate::config::SyncSettings;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::export::{parse_import, render_json_export};
use crate::models::{Conflict, QuoteRecord, Snapshot};
use crate::remote::{HttpGateway, RemoteGateway};
use crate::state::SyncState;
use crate::store::{LibSqlSnapshotStorage, RecordStore, SnapshotStorage};
use crate::sync::{SharedStore, SyncOrchestrator, SyncReport};
use crate::util::non_blank;

/// Key under which the selected category filter is stored
pub const FILTER_KEY: &str = "quip.filter.v1";

/// Thread-safe handle over the local quote collection and optional sync.
///
/// Clones share the same store, preferences and orchestrator.
#[derive(Clone)]
pub struct QuoteBook {
    store: SharedStore,
    preferences: Arc<dyn SnapshotStorage>,
    sync: Option<SyncOrchestrator>,
}

impl QuoteBook {
    /// Open the collection stored in the database at `db_path`.
    pub async fn open_path(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        tracing::debug!("Opening quote database at {}", db_path.display());
        let db = Database::open(db_path).await?;
        Self::with_database(db).await
    }

    /// Open an in-memory collection (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Self::with_database(db).await
    }

    async fn with_database(db: Database) -> Result<Self> {
        let db = Arc::new(Mutex::new(db));
        let quotes = Arc::new(LibSqlSnapshotStorage::new(db.clone()));
        let preferences = Arc::new(LibSqlSnapshotStorage::with_key(db, FILTER_KEY));
        Self::with_storage(quotes, preferences).await
    }

    /// Build on arbitrary storage backends
    pub async fn with_storage(
        quotes: Arc<dyn SnapshotStorage>,
        preferences: Arc<dyn SnapshotStorage>,
    ) -> Result<Self> {
        let store = RecordStore::open(quotes).await?;
        Ok(Self {
            store: Arc::new(Mutex::new(store)),
            preferences,
            sync: None,
        })
    }

    /// Attach an HTTP gateway built from `settings`, normalized and
    /// validated first.
    pub fn with_sync_settings(self, settings: &SyncSettings) -> Result<Self> {
        let settings = settings.clone().validated()?;
        let gateway = HttpGateway::new(&settings)?;
        tracing::debug!("Sync endpoint: {}", gateway.endpoint());
        Ok(self.with_gateway(Arc::new(gateway), settings.timeout()))
    }

    /// Attach a remote gateway; `timeout` bounds each pull and push
    #[must_use]
    pub fn with_gateway(mut self, gateway: Arc<dyn RemoteGateway>, timeout: Duration) -> Self {
        self.sync = Some(SyncOrchestrator::new(self.store.clone(), gateway, timeout));
        self
    }

    pub const fn is_sync_configured(&self) -> bool {
        self.sync.is_some()
    }

    /// Uniformly random quote, optionally restricted to a category
    /// (case-insensitive). `None` when nothing matches.
    pub async fn get_random_quote(&self, filter_category: Option<&str>) -> Option<QuoteRecord> {
        let store = self.store.lock().await;
        let candidates = matching(store.records(), filter_category);
        candidates
            .choose(&mut rand::thread_rng())
            .map(|record| (*record).clone())
    }

    /// Quotes in collection order, optionally restricted to a category
    pub async fn list_quotes(&self, filter_category: Option<&str>) -> Snapshot {
        let store = self.store.lock().await;
        matching(store.records(), filter_category)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Distinct categories, sorted
    pub async fn categories(&self) -> Vec<String> {
        self.store.lock().await.categories()
    }

    /// Validate and store a new local quote
    pub async fn add_quote(&self, text: &str, category: &str) -> Result<QuoteRecord> {
        let record = QuoteRecord::new(text, category);
        let stored = self.store.lock().await.append(record).await?;
        tracing::info!("Added quote in category {}", stored.category);
        Ok(stored)
    }

    /// Run one sync cycle, or join the one in flight
    pub async fn run_sync_cycle(&self) -> Result<SyncReport> {
        self.orchestrator()?.run_cycle().await
    }

    /// Restore the local category a sync conflict overwrote
    pub async fn revert_to_local(&self, conflict: &Conflict) -> Result<QuoteRecord> {
        self.store.lock().await.revert_to_local(conflict).await
    }

    /// Current collection as a pretty JSON array
    pub async fn export_snapshot(&self) -> Result<Vec<u8>> {
        let store = self.store.lock().await;
        render_json_export(store.records())
    }

    /// Append every quote in an exported payload, returning how many were added.
    ///
    /// Nothing is stored unless the whole payload is valid.
    pub async fn import_snapshot(&self, bytes: &[u8]) -> Result<usize> {
        let records = parse_import(bytes)?;
        let added = self.store.lock().await.append_all(records).await?.len();
        tracing::info!("Imported {added} quotes");
        Ok(added)
    }

    /// The persisted category filter, if one is set
    pub async fn category_filter(&self) -> Result<Option<String>> {
        let Some(payload) = self.preferences.read().await? else {
            return Ok(None);
        };
        match serde_json::from_str::<Option<String>>(&payload) {
            Ok(filter) => Ok(filter.as_deref().and_then(non_blank)),
            Err(error) => {
                tracing::warn!("Stored category filter is unreadable ({error}); ignoring it");
                Ok(None)
            }
        }
    }

    /// Persist the category filter; `None` or blank clears it
    pub async fn set_category_filter(&self, category: Option<&str>) -> Result<Option<String>> {
        let filter = category.and_then(non_blank);
        let payload = serde_json::to_string(&filter)?;
        self.preferences.write(&payload).await?;
        Ok(filter)
    }

    /// Start periodic sync, replacing any running schedule
    pub fn start_auto_sync(&self, interval: Duration) -> Result<()> {
        self.orchestrator()?.start_periodic(interval);
        Ok(())
    }

    /// Stop periodic sync, returning whether it was running
    pub fn stop_auto_sync(&self) -> bool {
        self.sync
            .as_ref()
            .is_some_and(SyncOrchestrator::stop_periodic)
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync
            .as_ref()
            .map_or(SyncState::Idle, SyncOrchestrator::state)
    }

    /// Completion time of the last successful sync cycle
    pub fn last_synced_at(&self) -> Option<i64> {
        self.sync.as_ref().and_then(SyncOrchestrator::last_synced_at)
    }

    fn orchestrator(&self) -> Result<&SyncOrchestrator> {
        self.sync.as_ref().ok_or(Error::SyncNotConfigured)
    }
}

fn matching<'a>(records: &'a [QuoteRecord], filter_category: Option<&str>) -> Vec<&'a QuoteRecord> {
    match filter_category.map(str::trim).filter(|category| !category.is_empty()) {
        Some(category) => records
            .iter()
            .filter(|record| record.in_category(category))
            .collect(),
        None => records.iter().collect(),
    }
}
