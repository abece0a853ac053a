//! Default values for cooperative locking options.

/// Upper bound for `lock_expiration_timeout_ms` (about 24 days).
pub const MAX_LOCK_EXPIRATION_TIMEOUT_MS: u64 = i32::MAX as u64;

// Default value functions for serde
pub(crate) fn default_lock_expiration_timeout_ms() -> u64 {
    120_000
}
pub(crate) fn default_max_concurrent_operations() -> usize {
    20
}
pub(crate) fn default_min_backoff_interval_ms() -> u64 {
    500
}
pub(crate) fn default_max_backoff_interval_ms() -> u64 {
    2_000
}
pub(crate) fn default_backoff_multiplier() -> f64 {
    1.2
}
pub(crate) fn default_backoff_randomization_factor() -> f64 {
    0.5
}
pub(crate) fn default_retry_lock_interval_ms() -> u64 {
    2_000
}
pub(crate) fn default_log_throttle_secs() -> u64 {
    5
}
