//! Transport boundary to the remote quote collection

mod http;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{QuoteRecord, Snapshot};

pub use http::{parse_remote_items, HttpGateway};

/// Acknowledgement for a pushed record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// HTTP status (or equivalent) reported by the remote
    pub status: u16,
}

/// The authoritative remote collection.
///
/// Implementations must fail with [`crate::Error::Transport`] and never return
/// a partially decoded snapshot. `push` is not idempotent: retrying it may
/// create duplicates on the remote side.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Fetch the full remote collection
    async fn pull(&self) -> Result<Snapshot>;

    /// Submit one record for creation on the remote side
    async fn push(&self, record: &QuoteRecord) -> Result<Ack>;
}
