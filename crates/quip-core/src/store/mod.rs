//! Local record store

mod record_store;
mod storage;

pub use record_store::RecordStore;
pub use storage::{LibSqlSnapshotStorage, SnapshotStorage, SNAPSHOT_KEY};
