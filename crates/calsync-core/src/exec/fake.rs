//! Deterministic fake executor for engine tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::domain::{SyncErrorKind, SyncTask};
use crate::ports::{CancelSignal, ExecutionOutcome, TaskExecutor};

/// Scripted executor: outcomes are keyed by `subject_id` and consumed in
/// order, with the last entry repeating. An unscripted subject succeeds.
///
/// With a gate attached, every execution blocks until the test hands out a
/// permit via [`FakeExecutor::release`], which makes in-flight states
/// observable without sleeping.
pub struct FakeExecutor {
    scripts: Mutex<HashMap<String, VecDeque<ExecutionOutcome>>>,
    calls: Mutex<HashMap<String, u32>>,
    gate: Option<Arc<Semaphore>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            gate: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Attach a gate with zero initial permits.
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::new()
        }
    }

    /// Script the outcomes for one subject. Last entry repeats forever, so
    /// `[failed]` means "always fails" and `[failed, failed, succeeded]`
    /// means "fails twice, then succeeds".
    pub fn script(self, subject_id: impl Into<String>, outcomes: Vec<ExecutionOutcome>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(subject_id.into(), outcomes.into());
        self
    }

    /// Shorthand: subject always fails with `kind`.
    pub fn always_failing(self, subject_id: impl Into<String>, kind: SyncErrorKind) -> Self {
        self.script(
            subject_id,
            vec![ExecutionOutcome::Failed {
                kind,
                message: "scripted failure".to_string(),
            }],
        )
    }

    /// Let `n` gated executions proceed.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Executions currently inside `execute`.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// High-water mark of concurrent executions.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Total executions across all subjects.
    pub fn total_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }

    /// How many times `subject_id` was executed.
    pub fn call_count(&self, subject_id: &str) -> u32 {
        self.calls
            .lock()
            .unwrap()
            .get(subject_id)
            .copied()
            .unwrap_or(0)
    }

    fn next_outcome(&self, subject_id: &str) -> ExecutionOutcome {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(subject_id) {
            Some(outcomes) if outcomes.len() > 1 => outcomes.pop_front().unwrap(),
            Some(outcomes) => outcomes
                .front()
                .cloned()
                .unwrap_or(ExecutionOutcome::Succeeded),
            None => ExecutionOutcome::Succeeded,
        }
    }
}

impl Default for FakeExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskExecutor for FakeExecutor {
    async fn execute(&self, task: &SyncTask, mut cancel: CancelSignal) -> ExecutionOutcome {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        *self
            .calls
            .lock()
            .unwrap()
            .entry(task.subject_id.clone())
            .or_insert(0) += 1;

        let outcome = if let Some(gate) = &self.gate {
            tokio::select! {
                permit = gate.acquire() => {
                    match permit {
                        Ok(permit) => {
                            permit.forget();
                            self.next_outcome(&task.subject_id)
                        }
                        Err(_) => ExecutionOutcome::Cancelled,
                    }
                }
                _ = cancel.wait_for(|&cancelled| cancelled) => ExecutionOutcome::Cancelled,
            }
        } else if *cancel.borrow() {
            ExecutionOutcome::Cancelled
        } else {
            self.next_outcome(&task.subject_id)
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskKind;
    use tokio::sync::watch;

    #[tokio::test]
    async fn last_scripted_outcome_repeats() {
        let exec = FakeExecutor::new().script(
            "e1",
            vec![
                ExecutionOutcome::Failed {
                    kind: SyncErrorKind::TransientNetwork,
                    message: "once".to_string(),
                },
                ExecutionOutcome::Succeeded,
            ],
        );
        let task = SyncTask::new(TaskKind::Create, "e1", vec![]);
        let (_tx, rx) = watch::channel(false);

        assert!(matches!(
            exec.execute(&task, rx.clone()).await,
            ExecutionOutcome::Failed { .. }
        ));
        assert_eq!(exec.execute(&task, rx.clone()).await, ExecutionOutcome::Succeeded);
        assert_eq!(exec.execute(&task, rx).await, ExecutionOutcome::Succeeded);
        assert_eq!(exec.call_count("e1"), 3);
    }

    #[tokio::test]
    async fn gate_blocks_until_released() {
        let exec = Arc::new(FakeExecutor::gated());
        let task = SyncTask::new(TaskKind::Update, "e2", vec![]);
        let (_tx, rx) = watch::channel(false);

        let running = tokio::spawn({
            let exec = Arc::clone(&exec);
            async move { exec.execute(&task, rx).await }
        });

        tokio::task::yield_now().await;
        assert_eq!(exec.in_flight(), 1);

        exec.release(1);
        assert_eq!(running.await.unwrap(), ExecutionOutcome::Succeeded);
        assert_eq!(exec.in_flight(), 0);
    }
}
