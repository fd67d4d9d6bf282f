//! Merge of a local snapshot against the authoritative remote snapshot.
//!
//! [`reconcile`] is a pure function: the same input pair always produces the
//! same merged snapshot, conflicts and stats.
//!
//! Policy:
//! - identity is the id when both records carry one, otherwise the exact text;
//!   id pairs are matched first, then text fallback runs over what is left,
//!   taking the first unconsumed remote record
//! - a matched pair keeps the remote copy; differing categories are reported
//!   as a [`Conflict`] and the remote category is kept (server precedence)
//! - unmatched local records are kept unchanged and listed for pushing
//! - unmatched remote records are appended in remote order
//!
//! Output order is the local order, followed by remote-only additions.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::models::{Conflict, QuoteId, QuoteRecord, Snapshot};

/// Counters describing one reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub conflicts_resolved: usize,
    pub remote_added: usize,
    pub local_pending_push: usize,
}

/// Result of [`reconcile`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Snapshot to commit locally
    pub merged: Snapshot,
    /// Pairs whose categories disagreed
    pub conflicts: Vec<Conflict>,
    /// Local-only records that should be pushed to the remote
    pub to_push: Vec<QuoteRecord>,
    pub stats: ReconcileStats,
}

/// Merge `local` into `remote` with server precedence
pub fn reconcile(local: &[QuoteRecord], remote: &[QuoteRecord]) -> Reconciliation {
    let mut index = RemoteIndex::build(remote);
    let mut merged = Vec::with_capacity(local.len() + remote.len());
    let mut conflicts = Vec::new();
    let mut to_push = Vec::new();

    // Id pairs are claimed before any text fallback so a legacy record can't
    // take a remote record that a local id already owns
    let id_matches = local
        .iter()
        .map(|record| index.take_id_match(record))
        .collect::<Vec<_>>();

    for (record, id_match) in local.iter().zip(id_matches) {
        match id_match.or_else(|| index.take_text_match(record)) {
            None => {
                merged.push(record.clone());
                to_push.push(record.clone());
            }
            Some(remote_record) if remote_record.category == record.category => {
                merged.push(remote_record.clone());
            }
            Some(remote_record) => {
                conflicts.push(Conflict {
                    local: record.clone(),
                    remote: remote_record.clone(),
                });
                let mut resolved = remote_record.clone();
                resolved.updated_at = record.updated_at.max(remote_record.updated_at);
                merged.push(resolved);
            }
        }
    }

    let additions = index.into_unconsumed(&merged);
    let stats = ReconcileStats {
        conflicts_resolved: conflicts.len(),
        remote_added: additions.len(),
        local_pending_push: to_push.len(),
    };
    merged.extend(additions);

    Reconciliation {
        merged,
        conflicts,
        to_push,
        stats,
    }
}

/// Lookup over the remote snapshot that tracks which records were consumed
struct RemoteIndex<'a> {
    records: &'a [QuoteRecord],
    by_id: HashMap<&'a QuoteId, usize>,
    by_text: HashMap<&'a str, Vec<usize>>,
    consumed: Vec<bool>,
}

impl<'a> RemoteIndex<'a> {
    fn build(records: &'a [QuoteRecord]) -> Self {
        let mut by_id = HashMap::new();
        let mut by_text: HashMap<&str, Vec<usize>> = HashMap::new();

        for (position, record) in records.iter().enumerate() {
            if let Some(id) = &record.id {
                by_id.entry(id).or_insert(position);
            }
            by_text
                .entry(record.text.as_str())
                .or_default()
                .push(position);
        }

        Self {
            records,
            by_id,
            by_text,
            consumed: vec![false; records.len()],
        }
    }

    /// Consume and return the remote record carrying the same id as `local`
    fn take_id_match(&mut self, local: &QuoteRecord) -> Option<&'a QuoteRecord> {
        let position = *self.by_id.get(local.id.as_ref()?)?;
        if self.consumed[position] {
            return None;
        }
        Some(self.consume(position))
    }

    /// Consume the first unclaimed remote record with the same text.
    ///
    /// Text is only an identity when one side has no id.
    fn take_text_match(&mut self, local: &QuoteRecord) -> Option<&'a QuoteRecord> {
        let position = self
            .by_text
            .get(local.text.as_str())?
            .iter()
            .copied()
            .find(|&position| {
                !self.consumed[position]
                    && (local.id.is_none() || self.records[position].id.is_none())
            })?;
        Some(self.consume(position))
    }

    fn consume(&mut self, position: usize) -> &'a QuoteRecord {
        self.consumed[position] = true;
        let records = self.records;
        &records[position]
    }

    /// Remote-only records in remote order.
    ///
    /// Records repeating an id already present in `merged` (or earlier in the
    /// remote snapshot) are skipped to keep ids unique.
    fn into_unconsumed(self, merged: &[QuoteRecord]) -> Vec<QuoteRecord> {
        let mut seen_ids = merged
            .iter()
            .filter_map(|record| record.id.as_ref())
            .collect::<HashSet<_>>();

        self.records
            .iter()
            .zip(self.consumed)
            .filter(|(_, consumed)| !consumed)
            .map(|(record, _)| record)
            .filter(|record| record.id.as_ref().is_none_or(|id| seen_ids.insert(id)))
            .cloned()
            .collect()
    }
}
