//! Durable backends for the serialized quote snapshot

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::db::{Database, KeyValueRepository, LibSqlKeyValueRepository};
use crate::error::Result;

/// Key under which the local quote snapshot is stored
pub const SNAPSHOT_KEY: &str = "quip.quotes.v1";

/// Storage for one serialized snapshot.
///
/// `write` must be all-or-nothing: after an error the previously stored
/// payload is still the one `read` returns.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Read the stored payload, `None` when nothing was written yet
    async fn read(&self) -> Result<Option<String>>;

    /// Replace the stored payload
    async fn write(&self, payload: &str) -> Result<()>;
}

/// Snapshot storage backed by a row in the libSQL key-value table
#[derive(Clone)]
pub struct LibSqlSnapshotStorage {
    db: Arc<Mutex<Database>>,
    key: String,
}

impl LibSqlSnapshotStorage {
    /// Store under the default snapshot key
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self::with_key(db, SNAPSHOT_KEY)
    }

    /// Store under a custom key
    pub fn with_key(db: Arc<Mutex<Database>>, key: impl Into<String>) -> Self {
        Self {
            db,
            key: key.into(),
        }
    }
}

#[async_trait]
impl SnapshotStorage for LibSqlSnapshotStorage {
    async fn read(&self) -> Result<Option<String>> {
        let db = self.db.lock().await;
        let repo = LibSqlKeyValueRepository::new(db.connection());
        repo.get(&self.key).await
    }

    async fn write(&self, payload: &str) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlKeyValueRepository::new(db.connection());
        repo.put(&self.key, payload).await
    }
}
