//! RemoteExecutor: timing, cancellation plumbing, and error normalization
//! around the injected remote calendar collaborator.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{SyncTask, TaskKind};
use crate::ports::{CancelSignal, ExecutionOutcome, RemoteCalendar, TaskExecutor};

/// Dispatches a task to the remote calendar by kind, racing the call
/// against the cancel signal.
///
/// The harness adds no retry logic of its own; retry-or-escalate belongs to
/// the engine. It only turns `Result<(), SyncError>` plus a cancel signal
/// into an [`ExecutionOutcome`].
pub struct RemoteExecutor {
    remote: Arc<dyn RemoteCalendar>,
}

impl RemoteExecutor {
    pub fn new(remote: Arc<dyn RemoteCalendar>) -> Self {
        Self { remote }
    }
}

#[async_trait]
impl TaskExecutor for RemoteExecutor {
    async fn execute(&self, task: &SyncTask, mut cancel: CancelSignal) -> ExecutionOutcome {
        if *cancel.borrow() {
            return ExecutionOutcome::Cancelled;
        }

        let call = async {
            match task.kind {
                TaskKind::Create => {
                    self.remote
                        .create_event(&task.subject_id, &task.payload)
                        .await
                }
                TaskKind::Update => {
                    self.remote
                        .update_event(&task.subject_id, &task.payload)
                        .await
                }
                TaskKind::Delete => self.remote.delete_event(&task.subject_id).await,
                TaskKind::FullSync => self.remote.full_sync(&task.subject_id).await,
            }
        };

        tokio::select! {
            result = call => match result {
                Ok(()) => ExecutionOutcome::Succeeded,
                Err(err) => {
                    debug!(task = %task.id, kind = ?err.kind, "remote call failed");
                    ExecutionOutcome::Failed {
                        kind: err.kind,
                        message: err.message,
                    }
                }
            },
            // A closed sender means the engine no longer tracks this task;
            // treat it the same as an explicit cancel.
            _ = cancel.wait_for(|&cancelled| cancelled) => ExecutionOutcome::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SyncError, SyncErrorKind};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::watch;

    /// Records which methods were called; scripted to fail or stall.
    #[derive(Default)]
    struct RecordingCalendar {
        calls: Mutex<Vec<String>>,
        fail_with: Option<SyncErrorKind>,
        stall: bool,
    }

    impl RecordingCalendar {
        fn record(&self, what: &str, subject: &str) {
            self.calls.lock().unwrap().push(format!("{what}:{subject}"));
        }

        async fn respond(&self) -> Result<(), SyncError> {
            if self.stall {
                std::future::pending::<()>().await;
            }
            match self.fail_with {
                Some(kind) => Err(SyncError::new(kind, "scripted failure")),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl RemoteCalendar for RecordingCalendar {
        async fn create_event(&self, subject_id: &str, _payload: &[u8]) -> Result<(), SyncError> {
            self.record("create", subject_id);
            self.respond().await
        }

        async fn update_event(&self, subject_id: &str, _payload: &[u8]) -> Result<(), SyncError> {
            self.record("update", subject_id);
            self.respond().await
        }

        async fn delete_event(&self, subject_id: &str) -> Result<(), SyncError> {
            self.record("delete", subject_id);
            self.respond().await
        }

        async fn full_sync(&self, subject_id: &str) -> Result<(), SyncError> {
            self.record("full_sync", subject_id);
            self.respond().await
        }
    }

    /// The sender must stay alive for the duration of the call; a dropped
    /// sender reads as cancellation.
    fn not_cancelled() -> (watch::Sender<bool>, CancelSignal) {
        watch::channel(false)
    }

    #[tokio::test]
    async fn dispatches_by_task_kind() {
        let remote = Arc::new(RecordingCalendar::default());
        let executor = RemoteExecutor::new(remote.clone());

        for (kind, expect) in [
            (TaskKind::Create, "create:e1"),
            (TaskKind::Update, "update:e1"),
            (TaskKind::Delete, "delete:e1"),
            (TaskKind::FullSync, "full_sync:e1"),
        ] {
            let (_tx, rx) = not_cancelled();
            let task = SyncTask::new(kind, "e1", vec![]);
            let outcome = executor.execute(&task, rx).await;
            assert_eq!(outcome, ExecutionOutcome::Succeeded);
            assert_eq!(remote.calls.lock().unwrap().last().unwrap(), expect);
        }
    }

    #[tokio::test]
    async fn normalizes_remote_error_kind() {
        let remote = Arc::new(RecordingCalendar {
            fail_with: Some(SyncErrorKind::Authentication),
            ..Default::default()
        });
        let executor = RemoteExecutor::new(remote);

        let (_tx, rx) = not_cancelled();
        let task = SyncTask::new(TaskKind::Update, "e2", vec![]);
        let outcome = executor.execute(&task, rx).await;

        match outcome {
            ExecutionOutcome::Failed { kind, .. } => {
                assert_eq!(kind, SyncErrorKind::Authentication)
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn pre_cancelled_signal_skips_remote_call() {
        let remote = Arc::new(RecordingCalendar::default());
        let executor = RemoteExecutor::new(remote.clone());

        let (tx, rx) = watch::channel(true);
        let task = SyncTask::new(TaskKind::Create, "e3", vec![]);
        let outcome = executor.execute(&task, rx).await;
        drop(tx);

        assert_eq!(outcome, ExecutionOutcome::Cancelled);
        assert!(remote.calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_call_returns_promptly() {
        let remote = Arc::new(RecordingCalendar {
            stall: true,
            ..Default::default()
        });
        let executor = RemoteExecutor::new(remote);
        let (tx, rx) = watch::channel(false);

        let task = SyncTask::new(TaskKind::FullSync, "cal-1", vec![]);
        let running = tokio::spawn(async move { executor.execute(&task, rx).await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        tx.send(true).unwrap();

        let outcome = running.await.unwrap();
        assert_eq!(outcome, ExecutionOutcome::Cancelled);
    }
}
