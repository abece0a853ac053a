//! The versioned aggregate stored in the lock file.

use super::record::LockRecord;
use crate::error::{CoopLockError, Result};
use serde::{Deserialize, Serialize};

/// Schema version written to, and required from, every record set.
pub const FORMAT_VERSION: u32 = 1;

/// Object path of the lock file inside a namespace.
pub const LOCK_PATH: &str = "_lock/all.lock";

/// Metadata key holding the serialized record set.
pub const LOCK_METADATA_KEY: &str = "lock";

/// All active lock records of a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRecordSet {
    pub format_version: u32,

    /// Active records, unique by operation id. Order carries no meaning.
    #[serde(default)]
    pub locks: Vec<LockRecord>,
}

impl Default for LockRecordSet {
    fn default() -> Self {
        Self::new()
    }
}

impl LockRecordSet {
    /// An empty record set at the current format version.
    pub fn new() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            locks: Vec::new(),
        }
    }

    /// Decode a record set and check its format version.
    ///
    /// Both a malformed document and a version mismatch are consistency
    /// errors: neither is ever coerced into an empty set.
    pub fn from_json(json: &str) -> Result<Self> {
        let records: LockRecordSet = serde_json::from_str(json).map_err(|e| {
            CoopLockError::Consistency(format!("failed to parse lock records: {}", e))
        })?;

        if records.format_version != FORMAT_VERSION {
            return Err(CoopLockError::Consistency(format!(
                "unsupported lock records format: expected {}, but was {}",
                FORMAT_VERSION, records.format_version
            )));
        }

        Ok(records)
    }

    /// Encode the record set as compact JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            CoopLockError::Serialization(format!("failed to serialize lock records: {}", e))
        })
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// Record held by `operation_id`, if any.
    pub fn find_operation(&self, operation_id: &str) -> Option<&LockRecord> {
        self.locks.iter().find(|r| r.operation_id == operation_id)
    }
}
