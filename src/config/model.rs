//! CooperativeLockingOptions struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Options for the cooperative locking protocol.
///
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooperativeLockingOptions {
    // =========================================================================
    // Lock settings
    // =========================================================================
    /// Milliseconds added to the current time to compute a lock's expiration.
    #[serde(default = "default_lock_expiration_timeout_ms")]
    pub lock_expiration_timeout_ms: u64,

    /// Maximum number of records the lock file may hold at once.
    #[serde(default = "default_max_concurrent_operations")]
    pub max_concurrent_operations: usize,

    // =========================================================================
    // Retry settings
    // =========================================================================
    /// Initial backoff interval after a failed conditional write.
    #[serde(default = "default_min_backoff_interval_ms")]
    pub min_backoff_interval_ms: u64,

    /// Upper bound for the backoff interval.
    #[serde(default = "default_max_backoff_interval_ms")]
    pub max_backoff_interval_ms: u64,

    /// Growth factor applied to the backoff interval after every failure.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Jitter: each sleep is drawn from `interval * (1 ± factor)`.
    #[serde(default = "default_backoff_randomization_factor")]
    pub backoff_randomization_factor: f64,

    /// Fixed sleep when resources are held by another operation.
    #[serde(default = "default_retry_lock_interval_ms")]
    pub retry_lock_interval_ms: u64,

    // =========================================================================
    // Logging settings
    // =========================================================================
    /// Minimum seconds between repeated retry log lines within one call.
    #[serde(default = "default_log_throttle_secs")]
    pub log_throttle_secs: u64,
}

impl Default for CooperativeLockingOptions {
    fn default() -> Self {
        Self {
            lock_expiration_timeout_ms: default_lock_expiration_timeout_ms(),
            max_concurrent_operations: default_max_concurrent_operations(),
            min_backoff_interval_ms: default_min_backoff_interval_ms(),
            max_backoff_interval_ms: default_max_backoff_interval_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            backoff_randomization_factor: default_backoff_randomization_factor(),
            retry_lock_interval_ms: default_retry_lock_interval_ms(),
            log_throttle_secs: default_log_throttle_secs(),
        }
    }
}
