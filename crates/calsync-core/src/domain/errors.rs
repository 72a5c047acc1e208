//! Error taxonomy for remote sync operations and the store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failed remote operation.
///
/// Every kind goes through the same retry budget; the kind is preserved on
/// the failure record so callers can react after escalation (for example,
/// `Authentication` should surface a re-authentication hint in the UI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncErrorKind {
    /// Connection dropped, timeout, 5xx — expected to heal on its own.
    TransientNetwork,

    /// Token expired or revoked. Retryable, but the user likely has to act.
    Authentication,

    /// Remote rejected the change because it no longer matches. The engine
    /// cannot resolve conflicts; it retries like any other failure.
    Conflict,

    /// Payload failed to decode or validate on either end.
    DataCorrupted,
}

impl SyncErrorKind {
    /// Short hint suitable for a failure-log line.
    pub fn hint(self) -> &'static str {
        match self {
            SyncErrorKind::TransientNetwork => "network unavailable; will retry",
            SyncErrorKind::Authentication => "re-authentication required",
            SyncErrorKind::Conflict => "remote conflict; resolve and retry",
            SyncErrorKind::DataCorrupted => "payload corrupted",
        }
    }
}

/// Error returned by a remote calendar collaborator.
#[derive(Debug, Clone, Error)]
#[error("{kind:?}: {message}")]
pub struct SyncError {
    pub kind: SyncErrorKind,
    pub message: String,
}

impl SyncError {
    pub fn new(kind: SyncErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(SyncErrorKind::TransientNetwork, message)
    }
}

/// Error from the durable store. The engine logs these and keeps going;
/// durability degrades to best-effort rather than failing a drain.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store task panicked or was cancelled: {0}")]
    Background(String),
}
