//! Executor implementations: the real remote harness and a scripted fake.

pub mod fake;
pub mod remote;

pub use self::fake::FakeExecutor;
pub use self::remote::RemoteExecutor;
