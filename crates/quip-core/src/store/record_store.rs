//! The local quote collection and its persisted form

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::{default_quotes, validate_quote_fields, Conflict, QuoteId, QuoteRecord, Snapshot};

use super::SnapshotStorage;

/// Owns the local snapshot.
///
/// Every mutation writes the new snapshot to storage first and only then
/// swaps it in memory, so a failed write leaves the store untouched.
pub struct RecordStore {
    records: Snapshot,
    storage: Arc<dyn SnapshotStorage>,
}

impl RecordStore {
    /// Seed the store from storage.
    ///
    /// Falls back to the built-in quotes when nothing is stored or the stored
    /// payload can't be decoded. Defaults are written back only in the first
    /// case so unreadable data is not silently overwritten on startup.
    pub async fn open(storage: Arc<dyn SnapshotStorage>) -> Result<Self> {
        let records = match storage.read().await? {
            Some(payload) => match serde_json::from_str::<Snapshot>(&payload) {
                Ok(records) => {
                    tracing::debug!("Loaded {} quotes from storage", records.len());
                    records
                }
                Err(error) => {
                    tracing::warn!("Stored quotes are unreadable ({error}); using defaults");
                    default_quotes()
                }
            },
            None => {
                let defaults = default_quotes();
                if let Err(error) = storage.write(&encode(&defaults)?).await {
                    tracing::warn!("Failed to persist default quotes: {error}");
                }
                defaults
            }
        };

        Ok(Self { records, storage })
    }

    /// Clone of the current snapshot
    pub fn load(&self) -> Snapshot {
        self.records.clone()
    }

    /// Borrow the current records
    pub fn records(&self) -> &[QuoteRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Validate, stamp and append a record, returning the stored copy
    pub async fn append(&mut self, record: QuoteRecord) -> Result<QuoteRecord> {
        let mut stored = self.append_all(vec![record]).await?;
        stored
            .pop()
            .ok_or_else(|| Error::Persistence("append produced no record".into()))
    }

    /// Append several records with a single write; nothing is stored unless
    /// every record is valid.
    pub async fn append_all(&mut self, records: Vec<QuoteRecord>) -> Result<Vec<QuoteRecord>> {
        let now = chrono::Utc::now().timestamp_millis();
        let mut seen_ids = self
            .records
            .iter()
            .filter_map(|record| record.id.clone())
            .collect::<HashSet<QuoteId>>();

        let mut prepared = Vec::with_capacity(records.len());
        for mut record in records {
            let (text, category) = validate_quote_fields(&record.text, &record.category)?;
            let id = record.id.take().unwrap_or_default();
            if !seen_ids.insert(id.clone()) {
                return Err(Error::Validation(format!("duplicate quote id {id}")));
            }
            record.id = Some(id);
            record.text = text;
            record.category = category;
            record.updated_at = now;
            prepared.push(record);
        }

        let mut next = self.records.clone();
        next.extend(prepared.iter().cloned());
        self.commit(next).await?;
        Ok(prepared)
    }

    /// Replace the whole snapshot, e.g. with a reconciled merge
    pub async fn replace_all(&mut self, records: Snapshot) -> Result<()> {
        self.commit(records).await
    }

    /// First record with the same identity (id when both have one, else text)
    pub fn find_by_identity(&self, record: &QuoteRecord) -> Option<&QuoteRecord> {
        self.records
            .iter()
            .find(|candidate| candidate.same_identity(record))
    }

    /// Restore the pre-merge local category for the record a conflict touched.
    ///
    /// The merged copy (same id, text and server category) is preferred so
    /// records that share text without ids are told apart; identity is the
    /// fallback once the record has changed since the merge.
    pub async fn revert_to_local(&mut self, conflict: &Conflict) -> Result<QuoteRecord> {
        let merged = &conflict.remote;
        let index = self
            .records
            .iter()
            .position(|candidate| {
                candidate.id == merged.id
                    && candidate.text == merged.text
                    && candidate.category == merged.category
            })
            .or_else(|| {
                self.records.iter().position(|candidate| {
                    candidate.same_identity(merged) || candidate.same_identity(&conflict.local)
                })
            })
            .ok_or_else(|| {
                Error::NotFound(
                    conflict
                        .local
                        .id
                        .as_ref()
                        .map_or_else(|| conflict.local.text.clone(), ToString::to_string),
                )
            })?;

        let mut next = self.records.clone();
        let record = &mut next[index];
        record.category.clone_from(&conflict.local.category);
        record.updated_at = chrono::Utc::now().timestamp_millis();
        let reverted = record.clone();

        self.commit(next).await?;
        tracing::info!("Restored local category for {}", conflict.describe());
        Ok(reverted)
    }

    /// Distinct categories, sorted
    pub fn categories(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|record| record.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    async fn commit(&mut self, next: Snapshot) -> Result<()> {
        self.storage.write(&encode(&next)?).await?;
        self.records = next;
        Ok(())
    }
}

fn encode(records: &[QuoteRecord]) -> Result<String> {
    serde_json::to_string(records).map_err(|error| Error::Persistence(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::MemoryStorage;
    use pretty_assertions::assert_eq;

    async fn open_with(records: &[QuoteRecord]) -> (RecordStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::with_payload(
            serde_json::to_string(records).unwrap(),
        ));
        let store = RecordStore::open(storage.clone()).await.unwrap();
        (store, storage)
    }

    #[tokio::test]
    async fn open_empty_storage_seeds_and_persists_defaults() {
        let storage = Arc::new(MemoryStorage::default());
        let store = RecordStore::open(storage.clone()).await.unwrap();

        assert_eq!(store.len(), 3);
        let persisted: Snapshot = serde_json::from_str(&storage.payload().unwrap()).unwrap();
        assert_eq!(persisted, store.load());
    }

    #[tokio::test]
    async fn open_corrupt_storage_falls_back_without_overwriting() {
        let storage = Arc::new(MemoryStorage::with_payload("{not json".to_string()));
        let store = RecordStore::open(storage.clone()).await.unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(storage.payload().as_deref(), Some("{not json"));
    }

    #[tokio::test]
    async fn open_foreign_json_falls_back() {
        let storage = Arc::new(MemoryStorage::with_payload(r#"{"quotes":1}"#.to_string()));
        let store = RecordStore::open(storage).await.unwrap();
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn append_assigns_id_and_persists() {
        let (mut store, storage) = open_with(&[]).await;

        let mut record = QuoteRecord::new("  Keep going  ", " Motivation ");
        record.id = None;
        let stored = store.append(record).await.unwrap();

        assert!(stored.id.is_some());
        assert_eq!(stored.text, "Keep going");
        assert_eq!(stored.category, "Motivation");
        assert_eq!(store.len(), 1);

        let persisted: Snapshot = serde_json::from_str(&storage.payload().unwrap()).unwrap();
        assert_eq!(persisted, vec![stored]);
    }

    #[tokio::test]
    async fn append_rejects_empty_fields_without_mutation() {
        let (mut store, storage) = open_with(&[]).await;
        let before = storage.payload();

        let error = store.append(QuoteRecord::new("", "x")).await.unwrap_err();
        assert!(matches!(error, Error::Validation(_)));
        let error = store.append(QuoteRecord::new("x", " ")).await.unwrap_err();
        assert!(matches!(error, Error::Validation(_)));

        assert!(store.is_empty());
        assert_eq!(storage.payload(), before);
    }

    #[tokio::test]
    async fn append_rejects_duplicate_id() {
        let existing = QuoteRecord::remote(1, "A", "X", 0);
        let (mut store, _) = open_with(&[existing]).await;

        let error = store
            .append(QuoteRecord::remote(1, "B", "Y", 0))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Validation(_)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn append_all_is_all_or_nothing() {
        let (mut store, _) = open_with(&[]).await;

        let result = store
            .append_all(vec![QuoteRecord::new("ok", "x"), QuoteRecord::new("", "x")])
            .await;
        assert!(result.is_err());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn failed_write_leaves_memory_unchanged() {
        let (mut store, storage) = open_with(&[QuoteRecord::remote(1, "A", "X", 0)]).await;
        storage.fail_writes(true);

        let error = store.append(QuoteRecord::new("B", "Y")).await.unwrap_err();
        assert!(matches!(error, Error::Persistence(_)));
        assert_eq!(store.len(), 1);

        let error = store.replace_all(Vec::new()).await.unwrap_err();
        assert!(matches!(error, Error::Persistence(_)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn find_by_identity_uses_id_then_text() {
        let mut legacy = QuoteRecord::new("Legacy", "Old");
        legacy.id = None;
        let (store, _) = open_with(&[QuoteRecord::remote(1, "A", "X", 0), legacy]).await;

        let by_id = QuoteRecord::remote(1, "different text", "X", 0);
        assert_eq!(store.find_by_identity(&by_id).unwrap().text, "A");

        let other_id = QuoteRecord::remote(2, "A", "X", 0);
        assert!(store.find_by_identity(&other_id).is_none());

        let by_text = QuoteRecord::remote(9, "Legacy", "New", 0);
        assert_eq!(store.find_by_identity(&by_text).unwrap().category, "Old");
    }

    #[tokio::test]
    async fn revert_to_local_restores_category() {
        let merged = QuoteRecord::remote(1, "A", "Z", 10);
        let (mut store, storage) = open_with(&[merged.clone()]).await;

        let conflict = Conflict {
            local: QuoteRecord::remote(1, "A", "X", 5),
            remote: merged,
        };
        let reverted = store.revert_to_local(&conflict).await.unwrap();

        assert_eq!(reverted.category, "X");
        assert!(reverted.updated_at > 10);
        let persisted: Snapshot = serde_json::from_str(&storage.payload().unwrap()).unwrap();
        assert_eq!(persisted[0].category, "X");
    }

    #[tokio::test]
    async fn revert_to_local_picks_the_conflicting_copy_among_shared_text() {
        let mut first = QuoteRecord::remote(0, "Same", "first", 0);
        first.id = None;
        let mut other = QuoteRecord::remote(0, "Same", "other", 0);
        other.id = None;
        let (mut store, _) = open_with(&[first.clone(), other.clone()]).await;

        let mut local = other.clone();
        local.category = "second".to_string();
        store
            .revert_to_local(&Conflict {
                local,
                remote: other,
            })
            .await
            .unwrap();

        let categories = store
            .records()
            .iter()
            .map(|record| record.category.as_str())
            .collect::<Vec<_>>();
        assert_eq!(categories, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn revert_to_local_missing_record() {
        let (mut store, _) = open_with(&[]).await;
        let conflict = Conflict {
            local: QuoteRecord::remote(1, "A", "X", 0),
            remote: QuoteRecord::remote(1, "A", "Z", 0),
        };
        assert!(matches!(
            store.revert_to_local(&conflict).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn categories_are_distinct_and_sorted() {
        let (store, _) = open_with(&[
            QuoteRecord::remote(1, "A", "Life", 0),
            QuoteRecord::remote(2, "B", "Art", 0),
            QuoteRecord::remote(3, "C", "Life", 0),
        ])
        .await;
        assert_eq!(store.categories(), vec!["Art", "Life"]);
    }
}
