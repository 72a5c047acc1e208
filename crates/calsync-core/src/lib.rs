//! calsync-core
//!
//! A durable, bounded-concurrency retry queue for propagating local
//! calendar changes to a remote system across network failures, partial
//! outages and app restarts.
//!
//! # Module layout
//! - **domain**: ids, task model, failure records, error taxonomy, events
//! - **backoff**: exponential backoff with jitter
//! - **ports**: trait seams ([`ports::TaskExecutor`], [`ports::RemoteCalendar`],
//!   [`ports::SyncStore`])
//! - **store**: JSON-file and in-memory store implementations
//! - **exec**: the remote-dispatch executor harness and a scripted fake
//! - **engine**: [`engine::SyncEngine`], the queue state machine
//! - **triggers**: periodic and connectivity-based drain triggers
//!
//! # Guarantees
//! At-least-once delivery: a task leaves the queue only through a
//! successful execution, an explicit cancel, or the failure log after its
//! retry budget is spent. State is written through to the store before any
//! completion event is published, so a crash re-attempts rather than loses
//! work. Idempotency of the remote operations themselves is the
//! [`ports::RemoteCalendar`] implementation's responsibility.

pub mod backoff;
pub mod domain;
pub mod engine;
pub mod exec;
pub mod ports;
pub mod store;
pub mod triggers;

pub use backoff::BackoffPolicy;
pub use domain::{
    EngineEvent, FailureRecord, Priority, SyncError, SyncErrorKind, SyncTask, TaskId, TaskKind,
};
pub use engine::{SyncConfig, SyncEngine, SyncStatistics};
pub use exec::{FakeExecutor, RemoteExecutor};
pub use ports::{ExecutionOutcome, PersistedState, RemoteCalendar, SyncStore, TaskExecutor};
pub use store::{JsonFileStore, MemoryStore};
