//! Engine events, published over a broadcast channel.
//!
//! Observers subscribe via [`crate::engine::SyncEngine::subscribe`]; a lagging
//! or absent subscriber never blocks the engine.

use chrono::{DateTime, Utc};

use super::{FailureId, SyncErrorKind, TaskId};

/// Per-task and per-drain notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Task executed successfully and left the queue.
    TaskSucceeded { id: TaskId },

    /// Task failed and was returned to pending with a backoff delay.
    TaskRetrying {
        id: TaskId,
        attempt: u32,
        kind: SyncErrorKind,
    },

    /// Task exhausted its retry budget and moved to the failure log.
    TaskExhausted { id: TaskId, failure_id: FailureId },

    /// Pending and active both emptied. Fires exactly once per drain cycle.
    DrainCompleted { at: DateTime<Utc> },
}
