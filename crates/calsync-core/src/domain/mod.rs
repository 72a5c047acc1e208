//! Domain model: ids, tasks, failure records, errors, events.

pub mod errors;
pub mod events;
pub mod failure;
pub mod ids;
pub mod task;

pub use self::errors::{StoreError, SyncError, SyncErrorKind};
pub use self::events::EngineEvent;
pub use self::failure::FailureRecord;
pub use self::ids::{FailureId, Id, IdMarker, TaskId};
pub use self::task::{Priority, SyncTask, TaskKind};
