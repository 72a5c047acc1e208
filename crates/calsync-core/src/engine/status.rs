//! Read-only statistics snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Consistent point-in-time view of the queue, taken under the state lock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncStatistics {
    pub pending_count: usize,
    pub active_count: usize,
    pub failed_count: usize,
    pub last_drain_at: Option<DateTime<Utc>>,
    pub is_draining: bool,

    /// Fraction of the current drain cycle already settled, in `[0, 1]`.
    /// `1.0` whenever no drain is running.
    pub progress: f64,
}
