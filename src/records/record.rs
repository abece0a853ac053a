//! A single operation's claim over a set of resources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Kind of operation holding a lock. Opaque to the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    Delete,
    Rename,
}

impl OperationType {
    /// Parse an operation type (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "delete" => Some(Self::Delete),
            "rename" => Some(Self::Rename),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Delete => "DELETE",
            OperationType::Rename => "RENAME",
        }
    }
}

/// Lock held by one operation.
///
/// Two records are equal when they share `operation_id` and the exact
/// `resources` set; client id and timestamps change on every reacquisition
/// and do not take part in identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRecord {
    /// Stable owner key of the lock for its whole life.
    pub operation_id: String,

    /// Liveness marker of the process currently driving the operation.
    pub client_id: String,

    pub operation_type: OperationType,

    /// When the operation was created.
    pub operation_time: DateTime<Utc>,

    /// After this instant the lock is considered abandoned.
    pub lock_expiration: DateTime<Utc>,

    /// Object paths covered by the lock, fixed at creation.
    pub resources: BTreeSet<String>,
}

impl LockRecord {
    /// Whether the lock has passed its expiration at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.lock_expiration <= now
    }

    /// Whether this record claims any of `resources` verbatim.
    pub fn covers_any(&self, resources: &BTreeSet<String>) -> bool {
        self.resources.iter().any(|r| resources.contains(r))
    }
}

impl PartialEq for LockRecord {
    fn eq(&self, other: &Self) -> bool {
        self.operation_id == other.operation_id && self.resources == other.resources
    }
}

impl Eq for LockRecord {}

impl Hash for LockRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.operation_id.hash(state);
        self.resources.hash(state);
    }
}

impl fmt::Display for LockRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, client: {}, expires: {}, resources: [{}])",
            self.operation_id,
            self.operation_type.as_str(),
            self.client_id,
            self.lock_expiration.to_rfc3339(),
            self.resources
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
