//! Cooperative, lease-based locking of hierarchical resource paths.
//!
//! Processes that share an object store coordinate through one lock file per
//! namespace. The lock file's metadata holds the set of active lock records,
//! and every change to it is a conditional update on the object's metadata
//! generation. See [`coordinator::LockCoordinator`] for the operations.

pub mod backoff;
pub mod client_id;
pub mod clock;
pub mod config;
pub mod conflict;
pub mod coordinator;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod records;
pub mod storage;

// Re-export public API
pub use config::CooperativeLockingOptions;
pub use coordinator::LockCoordinator;
pub use error::{CoopLockError, Result};
pub use records::{LockRecord, OperationType};
pub use storage::{FsStore, MemoryStore, ObjectStore, StorageResourceId};
