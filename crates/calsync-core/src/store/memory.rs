//! In-memory store for tests and development.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::StoreError;
use crate::ports::{PersistedState, SyncStore};

/// Keeps the persisted snapshot in memory. "Durable" only within the
/// process; useful for tests and for callers that opt out of persistence.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<PersistedState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a pre-existing snapshot (simulates a restart in tests).
    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Snapshot of what was last saved.
    pub async fn saved(&self) -> PersistedState {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl SyncStore for MemoryStore {
    async fn load(&self) -> Result<PersistedState, StoreError> {
        Ok(self.state.lock().await.clone())
    }

    async fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
        *self.state.lock().await = state.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SyncTask, TaskKind};

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = MemoryStore::new();
        let state = PersistedState {
            pending_tasks: vec![SyncTask::new(TaskKind::Create, "e1", vec![1])],
            failure_log: vec![],
            last_drain_timestamp: Some(chrono::Utc::now()),
        };

        store.save(&state).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn load_of_empty_store_is_default() {
        let store = MemoryStore::new();
        assert_eq!(store.load().await.unwrap(), PersistedState::default());
    }
}
