//! Store implementations.

pub mod json_file;
pub mod memory;

pub use self::json_file::JsonFileStore;
pub use self::memory::MemoryStore;
