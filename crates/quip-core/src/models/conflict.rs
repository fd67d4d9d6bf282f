//! Sync conflict model

use serde::{Deserialize, Serialize};

use super::QuoteRecord;

/// Same-identity pair whose categories disagreed during one reconciliation.
///
/// The merged collection already carries the remote value; the local copy is
/// kept so a user can restore it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// Local record before the merge
    pub local: QuoteRecord,
    /// Remote record that won
    pub remote: QuoteRecord,
}

impl Conflict {
    /// One-line description for notifications and logs
    #[must_use]
    pub fn describe(&self) -> String {
        let label = self
            .remote
            .id
            .as_ref()
            .map_or_else(|| self.remote.text.clone(), ToString::to_string);
        format!(
            "{label}: local \"{}\" replaced by server \"{}\"",
            self.local.category, self.remote.category
        )
    }
}
