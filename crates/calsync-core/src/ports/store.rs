//! SyncStore port: crash-safe persistence of queue state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{FailureRecord, StoreError, SyncTask};

/// The durable snapshot: everything the engine needs to resume after a
/// restart. Active tasks are deliberately absent — an execution that was
/// in flight at crash time is still pending as far as durability is
/// concerned, so it re-runs (at-least-once).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub pending_tasks: Vec<SyncTask>,

    #[serde(default)]
    pub failure_log: Vec<FailureRecord>,

    #[serde(default)]
    pub last_drain_timestamp: Option<DateTime<Utc>>,
}

/// Write-through persistence for the queue.
///
/// The engine awaits `save` before publishing any success/failure event, so
/// a crash between execution and persistence re-attempts the task rather
/// than losing it. Save errors are logged by the engine and swallowed:
/// in-memory operation continues with best-effort durability.
#[async_trait]
pub trait SyncStore: Send + Sync {
    async fn load(&self) -> Result<PersistedState, StoreError>;

    async fn save(&self, state: &PersistedState) -> Result<(), StoreError>;
}
