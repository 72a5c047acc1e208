//! Sync task model: immutable identity plus mutable retry state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TaskId;

/// What the remote call should do with the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Create,
    Update,
    Delete,
    FullSync,
}

/// Scheduling priority. Only affects selection order, never preemption.
///
/// `Ord` is derived with `Low` smallest so selection can sort descending.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// One unit of pending remote work.
///
/// Design:
/// - `id` is the identity; the pending set deduplicates on it.
/// - Retry state (`attempt_count`, `last_attempt_at`) is mutated only inside
///   the engine's state lock; nothing outside ever holds `&mut SyncTask`.
/// - Timestamps are wall-clock (`DateTime<Utc>`) because the record must
///   survive a restart through the durable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncTask {
    pub id: TaskId,
    pub kind: TaskKind,

    /// Id of the calendar event (or calendar, for full syncs) being synced.
    pub subject_id: String,

    /// Opaque serialized payload handed to the remote collaborator.
    #[serde(default)]
    pub payload: Vec<u8>,

    #[serde(default)]
    pub priority: Priority,

    pub created_at: DateTime<Utc>,

    /// Failed attempts so far. Incremented only when a failure is scheduled
    /// for retry; a cancelled execution does not count.
    #[serde(default)]
    pub attempt_count: u32,

    #[serde(default)]
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl SyncTask {
    pub fn new(kind: TaskKind, subject_id: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            id: TaskId::generate(),
            kind,
            subject_id: subject_id.into(),
            payload,
            priority: Priority::Normal,
            created_at: Utc::now(),
            attempt_count: 0,
            last_attempt_at: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Record a failed attempt that will be retried.
    pub fn record_failed_attempt(&mut self) {
        self.attempt_count += 1;
        self.last_attempt_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_starts_with_zero_attempts() {
        let task = SyncTask::new(TaskKind::Create, "event-1", vec![1, 2, 3]);
        assert_eq!(task.attempt_count, 0);
        assert!(task.last_attempt_at.is_none());
        assert_eq!(task.priority, Priority::Normal);
    }

    #[test]
    fn failed_attempt_bumps_count_and_timestamp() {
        let mut task = SyncTask::new(TaskKind::Update, "event-1", vec![]);
        task.record_failed_attempt();
        assert_eq!(task.attempt_count, 1);
        assert!(task.last_attempt_at.is_some());
    }

    #[test]
    fn priority_orders_low_to_critical() {
        assert!(Priority::Low < Priority::Normal);
        assert!(Priority::Normal < Priority::High);
        assert!(Priority::High < Priority::Critical);
    }

    #[test]
    fn task_round_trips_through_serde() {
        let mut task = SyncTask::new(TaskKind::Delete, "event-9", b"payload".to_vec());
        task.record_failed_attempt();

        let json = serde_json::to_string(&task).unwrap();
        let back: SyncTask = serde_json::from_str(&json).unwrap();

        assert_eq!(task, back);
        assert_eq!(back.attempt_count, 1);
        assert_eq!(back.last_attempt_at, task.last_attempt_at);
    }
}
