//! Drives sync cycles against a remote gateway

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::reconcile::{reconcile, ReconcileStats};
use crate::error::{Error, Result};
use crate::models::{Conflict, QuoteRecord};
use crate::remote::RemoteGateway;
use crate::state::SyncState;
use crate::store::RecordStore;
use crate::util::unix_millis_now;

/// The single local store, shared between the orchestrator and front ends
pub type SharedStore = Arc<tokio::sync::Mutex<RecordStore>>;

/// Outcome of one cycle, shared with every caller that waited on it
pub type SyncOutcome = Result<SyncReport>;

/// What a completed cycle did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub stats: ReconcileStats,
    /// Conflicts resolved in favour of the server during this cycle
    pub conflicts: Vec<Conflict>,
    /// Local-only records the remote accepted
    pub pushed: usize,
    /// Local-only records whose push failed (logged, not retried)
    pub push_failures: usize,
    /// Completion time (Unix ms)
    pub finished_at: i64,
}

impl SyncReport {
    /// User-facing notification text
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if self.stats.conflicts_resolved > 0 {
            parts.push(format!(
                "{} resolved (server wins)",
                plural(self.stats.conflicts_resolved, "conflict", "conflicts")
            ));
        }
        if self.stats.remote_added > 0 {
            parts.push(format!(
                "{} added from server",
                plural(self.stats.remote_added, "quote", "quotes")
            ));
        }
        if self.pushed > 0 {
            parts.push(format!(
                "{} pushed",
                plural(self.pushed, "local quote", "local quotes")
            ));
        }
        if self.push_failures > 0 {
            parts.push(format!(
                "{} failed",
                plural(self.push_failures, "push", "pushes")
            ));
        }

        if parts.is_empty() {
            "Synced: already up to date".to_string()
        } else {
            format!("Synced: {}", parts.join(", "))
        }
    }
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

enum Phase {
    Idle,
    Syncing(watch::Receiver<Option<SyncOutcome>>),
}

enum Entry {
    Leader(watch::Sender<Option<SyncOutcome>>),
    Follower(watch::Receiver<Option<SyncOutcome>>),
}

struct Inner {
    store: SharedStore,
    gateway: Arc<dyn RemoteGateway>,
    timeout: Duration,
    phase: Mutex<Phase>,
    last_outcome: Mutex<Option<SyncOutcome>>,
    periodic: Mutex<Option<JoinHandle<()>>>,
}

/// Runs pull → reconcile → commit → push cycles, at most one at a time.
///
/// Cloning is cheap; clones share the in-flight cycle, the last outcome and
/// the periodic task.
#[derive(Clone)]
pub struct SyncOrchestrator {
    inner: Arc<Inner>,
}

impl SyncOrchestrator {
    /// `timeout` bounds every individual pull and push
    pub fn new(store: SharedStore, gateway: Arc<dyn RemoteGateway>, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                gateway,
                timeout,
                phase: Mutex::new(Phase::Idle),
                last_outcome: Mutex::new(None),
                periodic: Mutex::new(None),
            }),
        }
    }

    /// Run one cycle, or wait for the one already in flight and return its
    /// outcome.
    pub async fn run_cycle(&self) -> SyncOutcome {
        let entry = {
            let mut phase = lock(&self.inner.phase);
            match &*phase {
                Phase::Syncing(receiver) => Entry::Follower(receiver.clone()),
                Phase::Idle => {
                    let (sender, receiver) = watch::channel(None);
                    *phase = Phase::Syncing(receiver);
                    Entry::Leader(sender)
                }
            }
        };

        match entry {
            Entry::Follower(receiver) => {
                tracing::debug!("Sync already in progress; waiting for its result");
                wait_for_outcome(receiver).await
            }
            Entry::Leader(sender) => {
                let _reset = PhaseReset(&self.inner);
                let outcome = self.execute_cycle().await;
                *lock(&self.inner.last_outcome) = Some(outcome.clone());
                sender.send_replace(Some(outcome.clone()));
                outcome
            }
        }
    }

    /// Current status
    pub fn state(&self) -> SyncState {
        if matches!(*lock(&self.inner.phase), Phase::Syncing(_)) {
            return SyncState::Syncing;
        }
        match &*lock(&self.inner.last_outcome) {
            None => SyncState::Idle,
            Some(Ok(_)) => SyncState::Synced,
            Some(Err(_)) => SyncState::Error,
        }
    }

    /// Outcome of the most recently completed cycle
    pub fn last_outcome(&self) -> Option<SyncOutcome> {
        lock(&self.inner.last_outcome).clone()
    }

    /// Report of the last cycle, if it succeeded
    pub fn last_report(&self) -> Option<SyncReport> {
        match &*lock(&self.inner.last_outcome) {
            Some(Ok(report)) => Some(report.clone()),
            _ => None,
        }
    }

    /// Completion time of the last successful cycle
    pub fn last_synced_at(&self) -> Option<i64> {
        match &*lock(&self.inner.last_outcome) {
            Some(Ok(report)) => Some(report.finished_at),
            _ => None,
        }
    }

    /// Run a cycle now and then on every `interval` tick.
    ///
    /// Replaces (and cancels) any periodic task started earlier. Must be called
    /// from within a Tokio runtime.
    pub fn start_periodic(&self, interval: Duration) {
        let orchestrator = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match orchestrator.run_cycle().await {
                    Ok(report) => tracing::info!("{}", report.summary()),
                    Err(error) => tracing::warn!("Periodic sync failed: {error}"),
                }
            }
        });

        if let Some(previous) = lock(&self.inner.periodic).replace(handle) {
            previous.abort();
            tracing::debug!("Replaced previous periodic sync task");
        }
        tracing::info!("Periodic sync every {interval:?}");
    }

    /// Cancel the periodic task, returning whether one was running
    pub fn stop_periodic(&self) -> bool {
        lock(&self.inner.periodic).take().is_some_and(|handle| {
            handle.abort();
            tracing::info!("Periodic sync stopped");
            true
        })
    }

    pub fn is_periodic_running(&self) -> bool {
        lock(&self.inner.periodic)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    async fn execute_cycle(&self) -> SyncOutcome {
        tracing::debug!("Sync cycle started");
        let remote = self.bounded("pull", self.inner.gateway.pull()).await?;

        let reconciliation = {
            let mut store = self.inner.store.lock().await;
            let reconciliation = reconcile(store.records(), &remote);
            if reconciliation.merged.as_slice() != store.records() {
                store.replace_all(reconciliation.merged.clone()).await?;
            }
            reconciliation
        };

        for conflict in &reconciliation.conflicts {
            tracing::info!("Conflict resolved by server precedence: {}", conflict.describe());
        }

        let (pushed, push_failures) = self.push_all(&reconciliation.to_push).await;

        let report = SyncReport {
            stats: reconciliation.stats,
            conflicts: reconciliation.conflicts,
            pushed,
            push_failures,
            finished_at: unix_millis_now(),
        };
        tracing::info!(
            conflicts = report.stats.conflicts_resolved,
            added = report.stats.remote_added,
            pushed = report.pushed,
            push_failures = report.push_failures,
            "Sync cycle finished"
        );
        Ok(report)
    }

    /// Push local-only records one by one; failures are logged and counted
    async fn push_all(&self, records: &[QuoteRecord]) -> (usize, usize) {
        let mut pushed = 0;
        let mut failures = 0;
        for record in records {
            match self.bounded("push", self.inner.gateway.push(record)).await {
                Ok(ack) => {
                    pushed += 1;
                    tracing::debug!("Pushed \"{}\" (status {})", record.text, ack.status);
                }
                Err(error) => {
                    failures += 1;
                    tracing::warn!("Failed to push \"{}\": {error}", record.text);
                }
            }
        }
        (pushed, failures)
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        future: impl Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        match tokio::time::timeout(self.inner.timeout, future).await {
            Ok(result) => result,
            Err(_) => Err(Error::Transport(format!(
                "{operation} timed out after {:?}",
                self.inner.timeout
            ))),
        }
    }
}

async fn wait_for_outcome(mut receiver: watch::Receiver<Option<SyncOutcome>>) -> SyncOutcome {
    match receiver.wait_for(Option::is_some).await {
        Ok(outcome) => outcome.clone().unwrap_or(Err(Error::SyncCancelled)),
        Err(_) => Err(Error::SyncCancelled),
    }
}

/// Returns the orchestrator to idle when the leading cycle ends or is dropped
struct PhaseReset<'a>(&'a Inner);

impl Drop for PhaseReset<'_> {
    fn drop(&mut self) {
        *lock(&self.0.phase) = Phase::Idle;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Snapshot;
    use crate::remote::Ack;
    use crate::store::testing::MemoryStorage;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockGateway {
        remote: Mutex<Snapshot>,
        pulls: AtomicUsize,
        pushed: Mutex<Vec<QuoteRecord>>,
        pull_delay: Duration,
        fail_pull: AtomicBool,
        reject_push_text: Option<String>,
    }

    impl MockGateway {
        fn with_remote(remote: Snapshot) -> Self {
            Self {
                remote: Mutex::new(remote),
                ..Self::default()
            }
        }

        fn pulls(&self) -> usize {
            self.pulls.load(Ordering::SeqCst)
        }

        fn pushed(&self) -> Vec<QuoteRecord> {
            self.pushed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteGateway for MockGateway {
        async fn pull(&self) -> Result<Snapshot> {
            self.pulls.fetch_add(1, Ordering::SeqCst);
            if !self.pull_delay.is_zero() {
                tokio::time::sleep(self.pull_delay).await;
            }
            if self.fail_pull.load(Ordering::SeqCst) {
                return Err(Error::Transport("connection refused".into()));
            }
            Ok(self.remote.lock().unwrap().clone())
        }

        async fn push(&self, record: &QuoteRecord) -> Result<Ack> {
            if self.reject_push_text.as_deref() == Some(record.text.as_str()) {
                return Err(Error::Transport("HTTP 500".into()));
            }
            self.pushed.lock().unwrap().push(record.clone());
            Ok(Ack { status: 201 })
        }
    }

    fn quote(id: u64, text: &str, category: &str) -> QuoteRecord {
        QuoteRecord::remote(id, text, category, 0)
    }

    async fn shared_store(records: &[QuoteRecord]) -> (SharedStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::with_payload(
            serde_json::to_string(records).unwrap(),
        ));
        let store = RecordStore::open(storage.clone()).await.unwrap();
        (Arc::new(tokio::sync::Mutex::new(store)), storage)
    }

    fn orchestrator(store: &SharedStore, gateway: &Arc<MockGateway>) -> SyncOrchestrator {
        SyncOrchestrator::new(store.clone(), gateway.clone(), Duration::from_secs(4))
    }

    #[tokio::test]
    async fn cycle_merges_commits_and_pushes() {
        let (store, storage) = shared_store(&[quote(1, "A", "X"), quote(2, "B", "Y")]).await;
        let gateway = Arc::new(MockGateway::with_remote(vec![
            quote(1, "A", "Z"),
            quote(3, "C", "W"),
        ]));
        let sync = orchestrator(&store, &gateway);

        let report = sync.run_cycle().await.unwrap();

        assert_eq!(
            report.stats,
            ReconcileStats {
                conflicts_resolved: 1,
                remote_added: 1,
                local_pending_push: 1,
            }
        );
        assert_eq!(report.conflicts[0].local.category, "X");
        assert_eq!(report.pushed, 1);
        assert_eq!(gateway.pushed(), vec![quote(2, "B", "Y")]);

        let expected = vec![quote(1, "A", "Z"), quote(2, "B", "Y"), quote(3, "C", "W")];
        assert_eq!(store.lock().await.load(), expected);
        let persisted: Snapshot = serde_json::from_str(&storage.payload().unwrap()).unwrap();
        assert_eq!(persisted, expected);
        assert_eq!(sync.state(), SyncState::Synced);
        assert_eq!(sync.last_report(), Some(report.clone()));
        assert!(sync.last_synced_at().is_some());
    }

    #[tokio::test]
    async fn pull_failure_leaves_local_state_untouched() {
        let local = vec![quote(1, "A", "X")];
        let (store, storage) = shared_store(&local).await;
        let before = storage.payload();
        let gateway = Arc::new(MockGateway::with_remote(vec![quote(1, "A", "Z")]));
        gateway.fail_pull.store(true, Ordering::SeqCst);
        let sync = orchestrator(&store, &gateway);

        let error = sync.run_cycle().await.unwrap_err();

        assert!(matches!(error, Error::Transport(_)));
        assert_eq!(store.lock().await.load(), local);
        assert_eq!(storage.payload(), before);
        assert!(gateway.pushed().is_empty());
        assert_eq!(sync.state(), SyncState::Error);
    }

    #[tokio::test]
    async fn push_failures_do_not_fail_the_cycle() {
        let (store, _) = shared_store(&[quote(1, "A", "X"), quote(2, "B", "Y")]).await;
        let gateway = Arc::new(MockGateway {
            reject_push_text: Some("A".to_string()),
            ..MockGateway::default()
        });
        let sync = orchestrator(&store, &gateway);

        let report = sync.run_cycle().await.unwrap();

        assert_eq!(report.pushed, 1);
        assert_eq!(report.push_failures, 1);
        assert_eq!(gateway.pushed(), vec![quote(2, "B", "Y")]);
        assert_eq!(store.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn persistence_failure_aborts_before_pushing() {
        let (store, storage) = shared_store(&[quote(2, "B", "Y")]).await;
        storage.fail_writes(true);
        let gateway = Arc::new(MockGateway::with_remote(vec![quote(3, "C", "W")]));
        let sync = orchestrator(&store, &gateway);

        let error = sync.run_cycle().await.unwrap_err();

        assert!(matches!(error, Error::Persistence(_)));
        assert_eq!(store.lock().await.load(), vec![quote(2, "B", "Y")]);
        assert!(gateway.pushed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_calls_share_one_pass() {
        let (store, _) = shared_store(&[quote(2, "B", "Y")]).await;
        let gateway = Arc::new(MockGateway {
            remote: Mutex::new(vec![quote(3, "C", "W")]),
            pull_delay: Duration::from_millis(50),
            ..MockGateway::default()
        });
        let sync = orchestrator(&store, &gateway);

        let (first, second) = tokio::join!(sync.run_cycle(), sync.run_cycle());

        assert_eq!(gateway.pulls(), 1);
        assert_eq!(gateway.pushed().len(), 1);
        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(store.lock().await.len(), 2);

        // Once idle again, a new call runs a fresh pass
        sync.run_cycle().await.unwrap();
        assert_eq!(gateway.pulls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_caller_sees_leader_failure() {
        let (store, _) = shared_store(&[]).await;
        let gateway = Arc::new(MockGateway {
            pull_delay: Duration::from_millis(50),
            ..MockGateway::default()
        });
        gateway.fail_pull.store(true, Ordering::SeqCst);
        let sync = orchestrator(&store, &gateway);

        let (first, second) = tokio::join!(sync.run_cycle(), sync.run_cycle());

        assert_eq!(gateway.pulls(), 1);
        assert!(matches!(first, Err(Error::Transport(_))));
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_pull_times_out() {
        let local = vec![quote(1, "A", "X")];
        let (store, _) = shared_store(&local).await;
        let gateway = Arc::new(MockGateway {
            pull_delay: Duration::from_secs(600),
            ..MockGateway::default()
        });
        let sync = SyncOrchestrator::new(store.clone(), gateway, Duration::from_secs(2));

        let error = sync.run_cycle().await.unwrap_err();

        assert!(matches!(error, Error::Transport(message) if message.contains("timed out")));
        assert_eq!(store.lock().await.load(), local);
        assert_eq!(sync.state(), SyncState::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_leader_returns_to_idle() {
        let (store, _) = shared_store(&[]).await;
        let gateway = Arc::new(MockGateway {
            pull_delay: Duration::from_millis(100),
            ..MockGateway::default()
        });
        let sync = orchestrator(&store, &gateway);

        let cancelled =
            tokio::time::timeout(Duration::from_millis(10), sync.run_cycle()).await;
        assert!(cancelled.is_err());
        assert_eq!(sync.state(), SyncState::Idle);

        sync.run_cycle().await.unwrap();
        assert_eq!(gateway.pulls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_periodic_sync_does_not_accumulate_tasks() {
        let (store, _) = shared_store(&[]).await;
        let gateway = Arc::new(MockGateway::default());
        let sync = orchestrator(&store, &gateway);

        sync.start_periodic(Duration::from_millis(40));
        sync.start_periodic(Duration::from_millis(40));
        assert!(sync.is_periodic_running());

        // Ticks at 0, 40 and 80 ms
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(gateway.pulls(), 3);

        assert!(sync.stop_periodic());
        assert!(!sync.stop_periodic());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(gateway.pulls(), 3);
        assert!(!sync.is_periodic_running());
    }

    #[test]
    fn summary_mentions_each_change() {
        let report = SyncReport {
            stats: ReconcileStats {
                conflicts_resolved: 1,
                remote_added: 2,
                local_pending_push: 1,
            },
            conflicts: Vec::new(),
            pushed: 1,
            push_failures: 0,
            finished_at: 0,
        };
        assert_eq!(
            report.summary(),
            "Synced: 1 conflict resolved (server wins), 2 quotes added from server, 1 local quote pushed"
        );

        let quiet = SyncReport {
            stats: ReconcileStats::default(),
            conflicts: Vec::new(),
            pushed: 0,
            push_failures: 0,
            finished_at: 0,
        };
        assert_eq!(quiet.summary(), "Synced: already up to date");
    }
}
