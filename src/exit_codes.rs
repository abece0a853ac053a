//! Exit code constants for the cooplock CLI.
//!
//! - 0: Success
//! - 1: Configuration error (unreadable or invalid options file)
//! - 2: Validation failure (bad resources, mixed namespaces)
//! - 3: Consistency failure (lock records disagree with the request)
//! - 4: Environment failure (local identity could not be resolved)
//! - 5: Storage failure (object store read failed)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// Configuration error: options file missing, unparseable or out of range.
pub const CONFIG_ERROR: i32 = 1;

/// Validation failure: empty resource list or resources spanning namespaces.
pub const VALIDATION_FAILURE: i32 = 2;

/// Consistency failure: format mismatch, lost lock, or release of foreign resources.
pub const CONSISTENCY_FAILURE: i32 = 3;

/// Environment failure: host identity could not be resolved.
pub const ENVIRONMENT_FAILURE: i32 = 4;

/// Storage failure: the lock file could not be read.
pub const STORAGE_FAILURE: i32 = 5;
