//! Engine-internal queue state.
//!
//! Everything here is mutated only while holding the engine's state lock;
//! no `&mut` ever escapes that boundary.

use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::domain::{FailureRecord, SyncTask, TaskId};
use crate::ports::PersistedState;

/// A task currently handed to the executor, plus its cancel channel.
pub(crate) struct ActiveTask {
    pub task: SyncTask,
    pub cancel_tx: watch::Sender<bool>,
}

/// Arena-style queue state: tasks live in id-keyed maps and a task id is in
/// at most one of `pending` / `active` at any time.
pub(crate) struct EngineState {
    pub pending: HashMap<TaskId, SyncTask>,
    pub active: HashMap<TaskId, ActiveTask>,
    pub failures: Vec<FailureRecord>,
    pub is_draining: bool,
    pub last_drain_at: Option<DateTime<Utc>>,

    /// Tasks settled (success or exhaustion) in the current drain cycle.
    /// Feeds the progress fraction; reset when a drain starts, never
    /// persisted.
    pub drain_completed: usize,
}

impl EngineState {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
            active: HashMap::new(),
            failures: Vec::new(),
            is_draining: false,
            last_drain_at: None,
            drain_completed: 0,
        }
    }

    /// Resume from a durable snapshot. Tasks that were mid-execution at
    /// crash time were persisted as pending, so they simply re-run.
    pub fn from_persisted(persisted: PersistedState) -> Self {
        let mut state = Self::new();
        for task in persisted.pending_tasks {
            state.pending.insert(task.id, task);
        }
        state.failures = persisted.failure_log;
        state.last_drain_at = persisted.last_drain_timestamp;
        state
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.pending.contains_key(&id) || self.active.contains_key(&id)
    }

    /// Drained means nothing left to run and nothing running.
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty() && self.active.is_empty()
    }

    /// Remove and return up to `slots` pending tasks in selection order:
    /// priority descending, then oldest first, then id as a stable
    /// tie-break (ULIDs order by creation time).
    pub fn take_eligible(&mut self, slots: usize) -> Vec<SyncTask> {
        if slots == 0 || self.pending.is_empty() {
            return Vec::new();
        }

        let mut order: Vec<(Reverse<crate::domain::Priority>, DateTime<Utc>, TaskId)> = self
            .pending
            .values()
            .map(|t| (Reverse(t.priority), t.created_at, t.id))
            .collect();
        order.sort();

        order
            .into_iter()
            .take(slots)
            .filter_map(|(_, _, id)| self.pending.remove(&id))
            .collect()
    }

    /// Durable view of this state. Active tasks are folded back into the
    /// pending list (their pre-execution record) so a crash re-attempts
    /// them instead of losing them.
    pub fn snapshot(&self) -> PersistedState {
        let mut pending_tasks: Vec<SyncTask> = self
            .pending
            .values()
            .chain(self.active.values().map(|a| &a.task))
            .cloned()
            .collect();
        pending_tasks.sort_by_key(|t| (t.created_at, t.id));

        PersistedState {
            pending_tasks,
            failure_log: self.failures.clone(),
            last_drain_timestamp: self.last_drain_at,
        }
    }
}
