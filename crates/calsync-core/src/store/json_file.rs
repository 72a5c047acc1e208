//! File-backed store: one JSON document, replaced atomically on save.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::StoreError;
use crate::ports::{PersistedState, SyncStore};

/// Persists the queue as a single pretty-printed JSON document at a fixed
/// path. The path acts as the namespace: one engine, one file.
///
/// Saves write to a sibling temp file and rename over the target, so a
/// crash mid-write leaves the previous snapshot intact. File IO runs on the
/// blocking pool; the engine awaits it before publishing events.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl SyncStore for JsonFileStore {
    async fn load(&self) -> Result<PersistedState, StoreError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                // First run: nothing persisted yet.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Ok(PersistedState::default());
                }
                Err(e) => return Err(StoreError::Io(e)),
            };
            Ok(serde_json::from_slice(&bytes)?)
        })
        .await
        .map_err(|e| StoreError::Background(e.to_string()))?
    }

    async fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
        let path = self.path.clone();
        let json = serde_json::to_vec_pretty(state)?;
        let pending = state.pending_tasks.len();
        let failed = state.failure_log.len();

        tokio::task::spawn_blocking(move || {
            let tmp = path.with_extension("json.tmp");
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&tmp, &json)?;
            std::fs::rename(&tmp, &path)?;
            Ok::<_, StoreError>(())
        })
        .await
        .map_err(|e| StoreError::Background(e.to_string()))??;

        debug!(pending, failed, "queue state persisted");
        Ok(())
    }
}
