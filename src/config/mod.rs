//! Configuration model for cooplock.
//!
//! This module defines the options that tune the cooperative locking protocol:
//! lock expiration, the record-count bound, and the two retry tiers (fixed
//! contention interval and exponential backoff for store errors). Options are
//! read from YAML with forward-compatible parsing (unknown fields are ignored)
//! and validated after parsing.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::CooperativeLockingOptions;
pub use types::MAX_LOCK_EXPIRATION_TIMEOUT_MS;
