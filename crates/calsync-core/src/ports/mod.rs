//! Ports: trait seams between the engine and its collaborators.
//!
//! The engine never talks to the network or the filesystem directly; it
//! goes through these traits so every collaborator can be swapped for a
//! fake in tests.

pub mod executor;
pub mod remote;
pub mod store;

pub use self::executor::{CancelSignal, ExecutionOutcome, TaskExecutor};
pub use self::remote::RemoteCalendar;
pub use self::store::{PersistedState, SyncStore};
