//! Persisted lock record model.
//!
//! One [`LockRecord`] exists per in-flight operation. All records of a
//! namespace live in a single versioned [`LockRecordSet`], serialized as JSON
//! into the metadata of the namespace's lock file (`_lock/all.lock`) under the
//! `lock` key.
//!
//! # Wire format
//!
//! ```json
//! {
//!   "formatVersion": 1,
//!   "locks": [
//!     {
//!       "operationId": "op-1",
//!       "clientId": "host-123456",
//!       "operationType": "DELETE",
//!       "operationTime": "2026-10-19T10:00:00Z",
//!       "lockExpiration": "2026-10-19T10:02:00Z",
//!       "resources": ["dir/a"]
//!     }
//!   ]
//! }
//! ```
//!
//! Readers reject any `formatVersion` other than [`FORMAT_VERSION`].

mod record;
mod record_set;

#[cfg(test)]
mod tests;

// Re-export public API
pub use record::{LockRecord, OperationType};
pub use record_set::{FORMAT_VERSION, LOCK_METADATA_KEY, LOCK_PATH, LockRecordSet};
