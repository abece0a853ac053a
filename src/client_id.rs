//! Client identity generation.
//!
//! A client id marks which process is currently driving an operation. It is a
//! liveness marker, regenerated on every acquire and reacquire, while the
//! operation id stays the stable owner key.

use crate::error::{CoopLockError, Result};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of fresh client ids.
pub trait ClientIdProvider: Send + Sync {
    /// Produce a new client id for a process acting on `operation_id`.
    fn new_client_id(&self, operation_id: &str) -> Result<String>;
}

/// Client ids of the form `{hostname}-{last 6 digits of epoch millis}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostClientIdProvider;

impl ClientIdProvider for HostClientIdProvider {
    fn new_client_id(&self, operation_id: &str) -> Result<String> {
        let host = hostname::get().map_err(|e| {
            CoopLockError::Environment(format!(
                "failed to get client id for {} operation: {}",
                operation_id, e
            ))
        })?;

        Ok(format_client_id(
            &host.to_string_lossy(),
            Utc::now().timestamp_millis(),
        ))
    }
}

/// Join a host name with the last six digits of an epoch-millis timestamp.
pub fn format_client_id(host: &str, epoch_millis: i64) -> String {
    let millis = epoch_millis.to_string();
    let suffix = &millis[millis.len().saturating_sub(6)..];
    format!("{}-{}", host, suffix)
}

/// Deterministic client ids `{prefix}-000001`, `{prefix}-000002`, ...
#[derive(Debug)]
pub struct SequentialClientIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialClientIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl ClientIdProvider for SequentialClientIds {
    fn new_client_id(&self, _operation_id: &str) -> Result<String> {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        Ok(format!("{}-{:06}", self.prefix, n))
    }
}
