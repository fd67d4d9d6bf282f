//! Reconciliation and sync cycle orchestration

mod orchestrator;
mod reconcile;

pub use orchestrator::{SharedStore, SyncOrchestrator, SyncOutcome, SyncReport};
pub use reconcile::{reconcile, ReconcileStats, Reconciliation};
