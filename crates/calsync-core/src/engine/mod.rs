//! SyncEngine: the durable, bounded-concurrency retry queue.
//!
//! One engine instance owns its store and executor (no globals); handles
//! are cheap clones sharing the same state. All queue mutations commit
//! under a single lock, and every transition that touches pending, active
//! or the failure log is written through to the store before the
//! corresponding event is published.

mod state;
mod status;

pub use self::status::SyncStatistics;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, Notify, broadcast, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace, warn};

use crate::backoff::BackoffPolicy;
use crate::domain::{EngineEvent, FailureRecord, SyncErrorKind, SyncTask, TaskId};
use crate::ports::{ExecutionOutcome, SyncStore, TaskExecutor};
use self::state::{ActiveTask, EngineState};

const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Upper bound on concurrently executing tasks. Clamped to at least 1.
    pub max_concurrency: usize,

    /// Retry budget: a task that fails this many times moves to the
    /// failure log.
    pub max_retries: u32,

    pub backoff: BackoffPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 3,
            max_retries: 5,
            backoff: BackoffPolicy::default(),
        }
    }
}

struct EngineInner {
    config: SyncConfig,
    store: Arc<dyn SyncStore>,
    executor: Arc<dyn TaskExecutor>,
    state: Mutex<EngineState>,
    events: broadcast::Sender<EngineEvent>,

    /// Wakes a running drain when the pending set or a slot changes
    /// underneath it (enqueue, cancel, retry_all).
    notify: Notify,
}

/// Handle to the sync engine. Clones share one queue.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

impl SyncEngine {
    /// Engine with an empty queue.
    pub fn new(
        config: SyncConfig,
        store: Arc<dyn SyncStore>,
        executor: Arc<dyn TaskExecutor>,
    ) -> Self {
        Self::with_state(config, store, executor, EngineState::new())
    }

    /// Engine resuming from whatever the store holds. A load error is
    /// logged and the engine starts empty; durability is best-effort by
    /// design, so a corrupt snapshot must not brick the caller.
    pub async fn restore(
        config: SyncConfig,
        store: Arc<dyn SyncStore>,
        executor: Arc<dyn TaskExecutor>,
    ) -> Self {
        let state = match store.load().await {
            Ok(persisted) => {
                info!(
                    pending = persisted.pending_tasks.len(),
                    failed = persisted.failure_log.len(),
                    "queue state restored"
                );
                EngineState::from_persisted(persisted)
            }
            Err(err) => {
                warn!(error = %err, "failed to load queue state; starting empty");
                EngineState::new()
            }
        };
        Self::with_state(config, store, executor, state)
    }

    fn with_state(
        mut config: SyncConfig,
        store: Arc<dyn SyncStore>,
        executor: Arc<dyn TaskExecutor>,
        state: EngineState,
    ) -> Self {
        config.max_concurrency = config.max_concurrency.max(1);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(EngineInner {
                config,
                store,
                executor,
                state: Mutex::new(state),
                events,
                notify: Notify::new(),
            }),
        }
    }

    /// Subscribe to per-task and per-drain events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.inner.events.subscribe()
    }

    /// Add a task to the queue. An id already present in pending or active
    /// is silently ignored (the first payload wins). Kicks off a drain if
    /// the engine is idle.
    pub async fn enqueue(&self, task: SyncTask) {
        let kick = {
            let mut state = self.inner.state.lock().await;
            if state.contains(task.id) {
                trace!(task = %task.id, "duplicate enqueue ignored");
                return;
            }
            debug!(task = %task.id, kind = ?task.kind, subject = %task.subject_id, "task enqueued");
            state.pending.insert(task.id, task);
            self.persist(&state).await;
            !state.is_draining
        };
        if kick {
            self.kick();
        } else {
            // A drain is running; let it pick the new task up.
            self.inner.notify.notify_one();
        }
    }

    /// Run the queue until pending and active are both empty, then publish
    /// one `DrainCompleted`. Re-entrant calls while a drain is running are
    /// a no-op, not an error.
    pub async fn drain(&self) {
        {
            let mut state = self.inner.state.lock().await;
            if state.is_draining {
                return;
            }
            state.is_draining = true;
            state.drain_completed = 0;
        }
        self.run_drain().await;
    }

    /// Remove a task from the queue. An active execution is signalled to
    /// cancel; whether or not it notices in time, its eventual result is
    /// discarded. No-op for unknown ids.
    pub async fn cancel(&self, id: TaskId) {
        let mut state = self.inner.state.lock().await;
        let mut removed = state.pending.remove(&id).is_some();
        if let Some(entry) = state.active.remove(&id) {
            let _ = entry.cancel_tx.send(true);
            removed = true;
        }
        if removed {
            debug!(task = %id, "task cancelled");
            self.persist(&state).await;
            self.inner.notify.notify_one();
        }
    }

    /// Convert every failure record back into a fresh task (new id,
    /// attempts reset), clear the log, and kick a drain.
    pub async fn retry_all(&self) {
        let kick = {
            let mut state = self.inner.state.lock().await;
            if state.failures.is_empty() {
                return;
            }
            let records: Vec<FailureRecord> = state.failures.drain(..).collect();
            info!(count = records.len(), "re-enqueueing failed tasks");
            for record in records {
                let task = record.to_fresh_task();
                state.pending.insert(task.id, task);
            }
            self.persist(&state).await;
            !state.is_draining
        };
        if kick {
            self.kick();
        } else {
            self.inner.notify.notify_one();
        }
    }

    /// Drop all failure records.
    pub async fn clear_failure_log(&self) {
        let mut state = self.inner.state.lock().await;
        if state.failures.is_empty() {
            return;
        }
        state.failures.clear();
        self.persist(&state).await;
    }

    /// Consistent snapshot of queue counters.
    pub async fn statistics(&self) -> SyncStatistics {
        let state = self.inner.state.lock().await;
        let remaining = state.pending.len() + state.active.len();
        let progress = if !state.is_draining || state.drain_completed + remaining == 0 {
            1.0
        } else {
            state.drain_completed as f64 / (state.drain_completed + remaining) as f64
        };
        SyncStatistics {
            pending_count: state.pending.len(),
            active_count: state.active.len(),
            failed_count: state.failures.len(),
            last_drain_at: state.last_drain_at,
            is_draining: state.is_draining,
            progress,
        }
    }

    /// The failure log, oldest first.
    pub async fn failure_log(&self) -> Vec<FailureRecord> {
        self.inner.state.lock().await.failures.clone()
    }

    /// Spawn a drain in the background.
    fn kick(&self) {
        let engine = self.clone();
        tokio::spawn(async move { engine.drain().await });
    }

    async fn run_drain(&self) {
        let mut running: JoinSet<(TaskId, ExecutionOutcome)> = JoinSet::new();
        // Maps tokio task ids to queue task ids so a panicked worker can
        // still be resolved and committed.
        let mut workers: HashMap<tokio::task::Id, TaskId> = HashMap::new();

        loop {
            let completed_at = {
                let mut state = self.inner.state.lock().await;
                let slots = self
                    .inner
                    .config
                    .max_concurrency
                    .saturating_sub(state.active.len());
                for task in state.take_eligible(slots) {
                    self.dispatch(&mut state, &mut running, &mut workers, task);
                }

                if state.is_settled() {
                    let at = Utc::now();
                    state.last_drain_at = Some(at);
                    state.is_draining = false;
                    self.persist(&state).await;
                    Some(at)
                } else {
                    None
                }
            };

            if let Some(at) = completed_at {
                info!("drain complete");
                let _ = self.inner.events.send(EngineEvent::DrainCompleted { at });
                return;
            }

            if running.is_empty() {
                // Not settled but nothing can produce a result: active
                // entries with no worker. Requeue them so the next pass
                // re-dispatches instead of losing them.
                let mut state = self.inner.state.lock().await;
                let orphaned: Vec<TaskId> = state.active.keys().copied().collect();
                for id in orphaned {
                    if let Some(entry) = state.active.remove(&id) {
                        state.pending.insert(id, entry.task);
                    }
                }
                continue;
            }

            // Wake on a finished worker, or on queue changes (enqueue,
            // cancel) that call for re-selection before any slot frees.
            tokio::select! {
                joined = running.join_next_with_id() => match joined {
                    Some(Ok((worker_id, (id, outcome)))) => {
                        workers.remove(&worker_id);
                        self.commit(id, outcome).await;
                    }
                    Some(Err(err)) => {
                        // A panicked worker still burns a retry attempt;
                        // the task must not vanish from the queue.
                        match workers.remove(&err.id()) {
                            Some(id) => {
                                error!(task = %id, error = %err, "sync worker panicked");
                                let outcome = ExecutionOutcome::Failed {
                                    kind: SyncErrorKind::DataCorrupted,
                                    message: format!("executor panicked: {err}"),
                                };
                                self.commit(id, outcome).await;
                            }
                            None => error!(error = %err, "sync worker panicked"),
                        }
                    }
                    None => {}
                },
                _ = self.inner.notify.notified() => {}
            }
        }
    }

    /// Promote one task to active and spawn its worker. The worker waits
    /// out the backoff delay for retries, then runs the executor; both
    /// phases abort early on cancellation.
    fn dispatch(
        &self,
        state: &mut EngineState,
        running: &mut JoinSet<(TaskId, ExecutionOutcome)>,
        workers: &mut HashMap<tokio::task::Id, TaskId>,
        task: SyncTask,
    ) {
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let delay = self.inner.config.backoff.delay(task.attempt_count);
        let task_id = task.id;
        state.active.insert(
            task.id,
            ActiveTask {
                task: task.clone(),
                cancel_tx,
            },
        );

        let executor = Arc::clone(&self.inner.executor);
        let handle = running.spawn(async move {
            if !delay.is_zero() {
                trace!(task = %task.id, ?delay, "waiting out backoff");
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel_rx.wait_for(|&cancelled| cancelled) => {
                        return (task.id, ExecutionOutcome::Cancelled);
                    }
                }
            }
            let outcome = executor.execute(&task, cancel_rx).await;
            (task.id, outcome)
        });
        workers.insert(handle.id(), task_id);
    }

    /// The single serialization point for execution results.
    async fn commit(&self, id: TaskId, outcome: ExecutionOutcome) {
        let mut published: Vec<EngineEvent> = Vec::new();
        {
            let mut state = self.inner.state.lock().await;
            let Some(entry) = state.active.remove(&id) else {
                // Late result for a cancelled/removed task.
                trace!(task = %id, "discarding result for removed task");
                return;
            };

            match outcome {
                ExecutionOutcome::Succeeded => {
                    debug!(task = %id, "task synced");
                    state.drain_completed += 1;
                    published.push(EngineEvent::TaskSucceeded { id });
                }
                ExecutionOutcome::Cancelled => {
                    // Neither success nor failure: drop without touching
                    // attempt_count or the failure log.
                    debug!(task = %id, "execution cancelled");
                }
                ExecutionOutcome::Failed { kind, message } => {
                    let mut task = entry.task;
                    let attempts = task.attempt_count + 1;
                    if attempts < self.inner.config.max_retries {
                        task.record_failed_attempt();
                        warn!(task = %id, attempt = attempts, ?kind, "sync failed; will retry");
                        published.push(EngineEvent::TaskRetrying {
                            id,
                            attempt: attempts,
                            kind,
                        });
                        state.pending.insert(id, task);
                    } else {
                        let record = FailureRecord::from_exhausted(&task, attempts, kind, message);
                        error!(
                            task = %id,
                            attempts,
                            ?kind,
                            hint = kind.hint(),
                            "retry budget exhausted"
                        );
                        published.push(EngineEvent::TaskExhausted {
                            id,
                            failure_id: record.id,
                        });
                        state.failures.push(record);
                        state.drain_completed += 1;
                    }
                }
            }
            self.persist(&state).await;
        }

        for event in published {
            let _ = self.inner.events.send(event);
        }
    }

    /// Write-through persistence; errors degrade to best-effort.
    async fn persist(&self, state: &EngineState) {
        if let Err(err) = self.inner.store.save(&state.snapshot()).await {
            warn!(error = %err, "persist failed; queue state is in-memory only");
        }
    }
}
