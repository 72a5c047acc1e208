//! TaskExecutor port: runs one task's remote operation.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::{SyncErrorKind, SyncTask};

/// Signal handed to an executor; flips to `true` when the task is cancelled.
pub type CancelSignal = watch::Receiver<bool>;

/// Result of one execution attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Succeeded,

    /// Normalized failure; the engine decides retry vs. escalate.
    Failed { kind: SyncErrorKind, message: String },

    /// Cancellation observed before or during execution. Neither a success
    /// nor a retry-worthy failure: the task is simply dropped, with
    /// `attempt_count` untouched and no failure record.
    Cancelled,
}

/// Executes a single task against the remote system.
///
/// Implementations must watch `cancel` and return `Cancelled` promptly when
/// it fires. The engine imposes no timeout of its own: an executor that
/// never resolves permanently occupies one concurrency slot.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(&self, task: &SyncTask, cancel: CancelSignal) -> ExecutionOutcome;
}
