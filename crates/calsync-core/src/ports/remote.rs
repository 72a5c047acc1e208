//! RemoteCalendar port: the concrete remote API, one method per task kind.

use async_trait::async_trait;

use crate::domain::SyncError;

/// The remote calendar API the engine syncs against.
///
/// The engine assumes at-least-once delivery: a call may be repeated after
/// a crash or a late cancellation, so implementations should be idempotent
/// (keyed on the subject id).
#[async_trait]
pub trait RemoteCalendar: Send + Sync {
    async fn create_event(&self, subject_id: &str, payload: &[u8]) -> Result<(), SyncError>;

    async fn update_event(&self, subject_id: &str, payload: &[u8]) -> Result<(), SyncError>;

    async fn delete_event(&self, subject_id: &str) -> Result<(), SyncError>;

    /// Reconcile the whole calendar identified by `subject_id`.
    async fn full_sync(&self, subject_id: &str) -> Result<(), SyncError>;
}
