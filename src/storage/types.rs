//! Resource identifiers, object descriptors and store errors.

use crate::error::{CoopLockError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Name of an object inside a namespace (e.g. a bucket).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StorageResourceId {
    /// Namespace holding the object; one lock file exists per namespace.
    pub namespace: String,

    /// `/`-delimited object path within the namespace.
    pub object_name: String,
}

impl StorageResourceId {
    /// Create a resource id from its parts.
    pub fn new(namespace: impl Into<String>, object_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            object_name: object_name.into(),
        }
    }

    /// Parse `namespace/object/name`.
    ///
    /// The first segment is the namespace and the remainder, trailing
    /// delimiter included, is the object name.
    pub fn parse(value: &str) -> Result<Self> {
        match value.split_once('/') {
            Some((namespace, object_name)) if !namespace.is_empty() && !object_name.is_empty() => {
                Ok(Self::new(namespace, object_name))
            }
            _ => Err(CoopLockError::Validation(format!(
                "resource '{}' must have the form <namespace>/<object>",
                value
            ))),
        }
    }
}

impl fmt::Display for StorageResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.object_name)
    }
}

/// Snapshot of a stored object's versions and metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// The object this snapshot describes.
    pub id: StorageResourceId,

    /// Content generation, assigned when the object is created.
    pub generation: u64,

    /// Metadata generation; bumped by every metadata update. Zero means the
    /// store never versioned this object's metadata.
    pub metageneration: u64,

    /// Opaque key/value metadata.
    pub metadata: BTreeMap<String, String>,
}

/// Errors reported by store primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The object's metageneration no longer matches the caller's.
    #[error("precondition failed for '{0}'")]
    PreconditionFailed(String),

    /// The object does not exist.
    #[error("object '{0}' not found")]
    NotFound(String),

    /// A no-overwrite create found the object already present.
    #[error("object '{0}' already exists")]
    AlreadyExists(String),

    /// Any other I/O or transport failure.
    #[error("{0}")]
    Io(String),
}

impl StoreError {
    /// Whether retrying from a fresh read can succeed.
    ///
    /// `AlreadyExists` only answers a no-overwrite create and means the
    /// object is there to be read.
    pub fn is_transient(&self) -> bool {
        !matches!(self, StoreError::AlreadyExists(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_namespace_from_object() {
        let id = StorageResourceId::parse("bucket/dir/a").unwrap();
        assert_eq!(id.namespace, "bucket");
        assert_eq!(id.object_name, "dir/a");
    }

    #[test]
    fn parse_keeps_trailing_delimiter() {
        let id = StorageResourceId::parse("bucket/dir/").unwrap();
        assert_eq!(id.object_name, "dir/");
        assert_eq!(id.to_string(), "bucket/dir/");
    }

    #[test]
    fn parse_rejects_missing_object() {
        for value in ["bucket", "bucket/", "/dir/a", ""] {
            let err = StorageResourceId::parse(value).unwrap_err();
            assert!(matches!(err, CoopLockError::Validation(_)), "{value}");
        }
    }

    #[test]
    fn only_already_exists_is_not_transient() {
        assert!(StoreError::PreconditionFailed("b/o".to_string()).is_transient());
        assert!(StoreError::NotFound("b/o".to_string()).is_transient());
        assert!(StoreError::Io("connection reset".to_string()).is_transient());
        assert!(!StoreError::AlreadyExists("b/o".to_string()).is_transient());
    }

    #[test]
    fn store_error_messages_name_the_object() {
        let err = StoreError::PreconditionFailed("b/_lock/all.lock".to_string());
        assert_eq!(err.to_string(), "precondition failed for 'b/_lock/all.lock'");
    }
}
