//! Shared cross-client state types.

use serde::Serialize;

/// Sync status as shown by clients.
///
/// `Syncing` while a cycle is in flight; otherwise idle, qualified by the
/// outcome of the last cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Idle,
    Syncing,
    Synced,
    Error,
}
