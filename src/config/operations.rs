//! Options loading, validation, and conversion helpers.

use super::model::CooperativeLockingOptions;
use super::types::MAX_LOCK_EXPIRATION_TIMEOUT_MS;
use crate::error::{CoopLockError, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::time::Duration;

impl CooperativeLockingOptions {
    /// Load options from a YAML file.
    ///
    /// # Returns
    ///
    /// * `Ok(CooperativeLockingOptions)` - Successfully loaded and validated options
    /// * `Err(CoopLockError::Config)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            CoopLockError::Config(format!(
                "failed to read options file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse options from a YAML string.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to a map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let options: CooperativeLockingOptions = serde_yaml::from_str(yaml)
            .map_err(|e| CoopLockError::Config(format!("failed to parse options YAML: {}", e)))?;

        options.validate()?;
        Ok(options)
    }

    /// Serialize options to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| CoopLockError::Config(format!("failed to serialize options: {}", e)))
    }

    /// Validate option values.
    ///
    /// Validation rules:
    /// - `lock_expiration_timeout_ms` must not exceed
    ///   [`MAX_LOCK_EXPIRATION_TIMEOUT_MS`]
    /// - `lock_expiration_timeout_ms`, `max_concurrent_operations` and
    ///   `min_backoff_interval_ms` must be positive
    /// - `max_backoff_interval_ms` must not be below `min_backoff_interval_ms`
    /// - `backoff_multiplier` must be at least 1.0
    /// - `backoff_randomization_factor` must lie in `[0, 1)`
    pub fn validate(&self) -> Result<()> {
        if self.lock_expiration_timeout_ms == 0 {
            return Err(invalid("lock_expiration_timeout_ms must be greater than 0"));
        }

        if self.lock_expiration_timeout_ms > MAX_LOCK_EXPIRATION_TIMEOUT_MS {
            return Err(CoopLockError::Config(format!(
                "options validation failed: lock_expiration_timeout_ms ({}) must not exceed {}",
                self.lock_expiration_timeout_ms, MAX_LOCK_EXPIRATION_TIMEOUT_MS
            )));
        }

        if self.max_concurrent_operations == 0 {
            return Err(invalid("max_concurrent_operations must be greater than 0"));
        }

        if self.min_backoff_interval_ms == 0 {
            return Err(invalid("min_backoff_interval_ms must be greater than 0"));
        }

        if self.max_backoff_interval_ms < self.min_backoff_interval_ms {
            return Err(CoopLockError::Config(format!(
                "options validation failed: max_backoff_interval_ms ({}) must not be less than min_backoff_interval_ms ({})",
                self.max_backoff_interval_ms, self.min_backoff_interval_ms
            )));
        }

        if self.backoff_multiplier.is_nan() || self.backoff_multiplier < 1.0 {
            return Err(invalid("backoff_multiplier must be at least 1.0"));
        }

        if !(0.0..1.0).contains(&self.backoff_randomization_factor) {
            return Err(invalid(
                "backoff_randomization_factor must be in the range [0, 1)",
            ));
        }

        Ok(())
    }

    /// Lock expiration horizon as a chrono duration.
    ///
    /// Saturates at `i64::MAX` milliseconds for unvalidated options.
    pub fn lock_expiration_timeout(&self) -> chrono::Duration {
        let millis = i64::try_from(self.lock_expiration_timeout_ms).unwrap_or(i64::MAX);
        chrono::Duration::milliseconds(millis)
    }

    /// Expiration of a lock taken or refreshed at `now`.
    pub fn lock_expiration_after(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        now.checked_add_signed(self.lock_expiration_timeout())
            .ok_or_else(|| {
                CoopLockError::Config(format!(
                    "lock_expiration_timeout_ms ({}) is out of range",
                    self.lock_expiration_timeout_ms
                ))
            })
    }

    /// Fixed contention retry interval.
    pub fn retry_lock_interval(&self) -> Duration {
        Duration::from_millis(self.retry_lock_interval_ms)
    }

    /// Window for throttled retry logging.
    pub fn log_throttle(&self) -> Duration {
        Duration::from_secs(self.log_throttle_secs)
    }
}

fn invalid(message: &str) -> CoopLockError {
    CoopLockError::Config(format!("options validation failed: {}", message))
}
