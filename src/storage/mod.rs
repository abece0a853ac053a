//! Object store seam for the lock file.
//!
//! The coordinator only needs four primitives from a store: read an object's
//! metadata and version, create an empty object without overwriting, and
//! update or delete an object conditioned on its metadata generation. Any
//! key/value or object store with version tokens can provide them.
//!
//! Two implementations ship with the crate:
//! - [`MemoryStore`]: process-local, with fault injection for tests
//! - [`FsStore`]: one JSON document per object under a root directory, safe
//!   across processes sharing that directory

mod atomic;
mod fs;
mod guard;
mod memory;
mod types;

// Re-export public API
pub use fs::FsStore;
pub use memory::{MemoryStore, StoreStats};
pub use types::{ObjectInfo, StorageResourceId, StoreError};

use std::collections::BTreeMap;

/// Result type for store primitives.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Conditional-update capable object store.
pub trait ObjectStore: Send + Sync {
    /// Read the object's versions and metadata, or `None` if it does not exist.
    fn get_object_info(&self, id: &StorageResourceId) -> StoreResult<Option<ObjectInfo>>;

    /// Create an empty object with no metadata.
    ///
    /// Fails with [`StoreError::AlreadyExists`] if the object is present.
    fn create_empty_object(&self, id: &StorageResourceId) -> StoreResult<()>;

    /// Replace the object's metadata if its metageneration still equals
    /// `metageneration`.
    fn update_metadata(
        &self,
        id: &StorageResourceId,
        metageneration: u64,
        metadata: BTreeMap<String, String>,
    ) -> StoreResult<ObjectInfo>;

    /// Delete the object if its metageneration still equals `metageneration`.
    fn delete_object(&self, id: &StorageResourceId, metageneration: u64) -> StoreResult<()>;
}

impl<S: ObjectStore + ?Sized> ObjectStore for std::sync::Arc<S> {
    fn get_object_info(&self, id: &StorageResourceId) -> StoreResult<Option<ObjectInfo>> {
        (**self).get_object_info(id)
    }

    fn create_empty_object(&self, id: &StorageResourceId) -> StoreResult<()> {
        (**self).create_empty_object(id)
    }

    fn update_metadata(
        &self,
        id: &StorageResourceId,
        metageneration: u64,
        metadata: BTreeMap<String, String>,
    ) -> StoreResult<ObjectInfo> {
        (**self).update_metadata(id, metageneration, metadata)
    }

    fn delete_object(&self, id: &StorageResourceId, metageneration: u64) -> StoreResult<()> {
        (**self).delete_object(id, metageneration)
    }
}
