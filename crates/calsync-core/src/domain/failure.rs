//! Terminal failure records: tasks that exhausted their retry budget.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FailureId, Priority, SyncErrorKind, SyncTask, TaskId, TaskKind};

/// Append-only record of a task that ran out of retries.
///
/// Immutable once created. The only ways out of the log are
/// `retry_all` (which converts records back into fresh tasks) and
/// `clear_failure_log`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub id: FailureId,
    pub originating_task_id: TaskId,
    pub subject_id: String,
    pub kind: TaskKind,

    /// Payload carried over so `retry_all` can rebuild the task.
    #[serde(default)]
    pub payload: Vec<u8>,

    /// Priority carried over so retried tasks keep their urgency.
    #[serde(default)]
    pub priority: Priority,

    /// Attempts made before giving up (equals the retry budget).
    pub attempt_count: u32,

    pub error_kind: SyncErrorKind,

    /// Human-readable description for the failure log UI.
    pub error: String,

    pub occurred_at: DateTime<Utc>,
}

impl FailureRecord {
    /// Build the terminal record for an exhausted task.
    pub fn from_exhausted(task: &SyncTask, attempts: u32, kind: SyncErrorKind, error: String) -> Self {
        Self {
            id: FailureId::generate(),
            originating_task_id: task.id,
            subject_id: task.subject_id.clone(),
            kind: task.kind,
            payload: task.payload.clone(),
            priority: task.priority,
            attempt_count: attempts,
            error_kind: kind,
            error,
            occurred_at: Utc::now(),
        }
    }

    /// Rebuild a fresh task from this record: new id, attempts reset,
    /// original priority kept.
    pub fn to_fresh_task(&self) -> SyncTask {
        SyncTask::new(self.kind, self.subject_id.clone(), self.payload.clone())
            .with_priority(self.priority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_record_carries_task_identity() {
        let task = SyncTask::new(TaskKind::Create, "event-1", b"p".to_vec());
        let record = FailureRecord::from_exhausted(
            &task,
            5,
            SyncErrorKind::TransientNetwork,
            "gave up".to_string(),
        );

        assert_eq!(record.originating_task_id, task.id);
        assert_eq!(record.subject_id, "event-1");
        assert_eq!(record.attempt_count, 5);
    }

    #[test]
    fn fresh_task_resets_retry_state_with_new_id() {
        let task = SyncTask::new(TaskKind::Update, "event-2", b"body".to_vec())
            .with_priority(Priority::Critical);
        let record = FailureRecord::from_exhausted(
            &task,
            3,
            SyncErrorKind::Conflict,
            "conflict".to_string(),
        );

        let fresh = record.to_fresh_task();
        assert_ne!(fresh.id, task.id);
        assert_eq!(fresh.attempt_count, 0);
        assert_eq!(fresh.kind, TaskKind::Update);
        assert_eq!(fresh.payload, b"body".to_vec());
        assert_eq!(fresh.priority, Priority::Critical);
    }
}
