//! Directory-backed object store.
//!
//! # Layout
//!
//! Each object is a JSON document at `{root}/{namespace}/{object_name}`:
//! - `generation`: assigned at creation (microseconds since the epoch)
//! - `metageneration`: starts at 1 and grows with every metadata update
//! - `metadata`: string key/value map
//!
//! # Conditional operations
//!
//! Every mutating call holds an exclusive advisory lock on the object's guard
//! file (`{object_name}.guard`) while it reads, compares and atomically
//! replaces the document. Processes sharing the root directory
//! therefore observe a linearizable compare-and-swap per object.

use super::atomic::atomic_write;
use super::guard::ObjectGuard;
use super::types::{ObjectInfo, StorageResourceId, StoreError};
use super::{ObjectStore, StoreResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct ObjectDocument {
    generation: u64,
    metageneration: u64,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

/// Object store rooted at a local (or shared) directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a store rooted at `root`; the directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document backing `id`.
    pub fn object_path(&self, id: &StorageResourceId) -> StoreResult<PathBuf> {
        let relative = Path::new(&id.namespace).join(&id.object_name);
        let is_plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !is_plain || id.object_name.ends_with('/') {
            return Err(StoreError::Io(format!(
                "'{}' cannot be stored as a file",
                id
            )));
        }
        Ok(self.root.join(relative))
    }

    fn guard_path(object_path: &Path) -> PathBuf {
        let mut name = object_path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(".guard");
        object_path.with_file_name(name)
    }

    fn read_document(path: &Path) -> StoreResult<Option<ObjectDocument>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Io(format!(
                    "failed to read '{}': {}",
                    path.display(),
                    e
                )));
            }
        };

        serde_json::from_str(&content).map(Some).map_err(|e| {
            StoreError::Io(format!("failed to parse '{}': {}", path.display(), e))
        })
    }

    fn write_document(path: &Path, document: &ObjectDocument) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(document)
            .map_err(|e| StoreError::Io(format!("failed to encode object document: {}", e)))?;
        atomic_write(path, &json).map_err(|e| {
            StoreError::Io(format!("failed to write '{}': {}", path.display(), e))
        })
    }

    fn info(id: &StorageResourceId, document: ObjectDocument) -> ObjectInfo {
        ObjectInfo {
            id: id.clone(),
            generation: document.generation,
            metageneration: document.metageneration,
            metadata: document.metadata,
        }
    }
}

impl ObjectStore for FsStore {
    fn get_object_info(&self, id: &StorageResourceId) -> StoreResult<Option<ObjectInfo>> {
        let path = self.object_path(id)?;
        Ok(Self::read_document(&path)?.map(|document| Self::info(id, document)))
    }

    fn create_empty_object(&self, id: &StorageResourceId) -> StoreResult<()> {
        let path = self.object_path(id)?;
        let _guard = ObjectGuard::acquire(&Self::guard_path(&path))?;

        if Self::read_document(&path)?.is_some() {
            return Err(StoreError::AlreadyExists(id.to_string()));
        }

        let document = ObjectDocument {
            generation: Utc::now().timestamp_micros().max(1) as u64,
            metageneration: 1,
            metadata: BTreeMap::new(),
        };
        Self::write_document(&path, &document)
    }

    fn update_metadata(
        &self,
        id: &StorageResourceId,
        metageneration: u64,
        metadata: BTreeMap<String, String>,
    ) -> StoreResult<ObjectInfo> {
        let path = self.object_path(id)?;
        let _guard = ObjectGuard::acquire(&Self::guard_path(&path))?;

        let Some(mut document) = Self::read_document(&path)? else {
            return Err(StoreError::NotFound(id.to_string()));
        };
        if document.metageneration != metageneration {
            return Err(StoreError::PreconditionFailed(id.to_string()));
        }

        document.metageneration += 1;
        document.metadata = metadata;
        Self::write_document(&path, &document)?;
        Ok(Self::info(id, document))
    }

    fn delete_object(&self, id: &StorageResourceId, metageneration: u64) -> StoreResult<()> {
        let path = self.object_path(id)?;
        let _guard = ObjectGuard::acquire(&Self::guard_path(&path))?;

        let Some(document) = Self::read_document(&path)? else {
            return Err(StoreError::NotFound(id.to_string()));
        };
        if document.metageneration != metageneration {
            return Err(StoreError::PreconditionFailed(id.to_string()));
        }

        fs::remove_file(&path).map_err(|e| {
            StoreError::Io(format!("failed to delete '{}': {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn lock_id() -> StorageResourceId {
        StorageResourceId::new("bucket", "_lock/all.lock")
    }

    fn metadata(value: &str) -> BTreeMap<String, String> {
        BTreeMap::from([("lock".to_string(), value.to_string())])
    }

    #[test]
    fn test_object_path_layout() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsStore::new(temp_dir.path());

        let path = store.object_path(&lock_id()).unwrap();
        assert_eq!(path, temp_dir.path().join("bucket").join("_lock").join("all.lock"));
        assert_eq!(
            FsStore::guard_path(&path),
            temp_dir.path().join("bucket").join("_lock").join("all.lock.guard")
        );
    }

    #[test]
    fn test_object_path_rejects_escapes_and_directories() {
        let store = FsStore::new("/tmp/store");
        assert!(store.object_path(&StorageResourceId::new("b", "../x")).is_err());
        assert!(store.object_path(&StorageResourceId::new("b", "dir/")).is_err());
        assert!(store.object_path(&StorageResourceId::new("..", "x")).is_err());
    }

    #[test]
    fn test_missing_object_reads_as_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsStore::new(temp_dir.path());

        assert!(store.get_object_info(&lock_id()).unwrap().is_none());
    }

    #[test]
    fn test_create_then_update_then_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsStore::new(temp_dir.path());

        store.create_empty_object(&lock_id()).unwrap();
        let created = store.get_object_info(&lock_id()).unwrap().unwrap();
        assert_eq!(created.metageneration, 1);
        assert!(created.generation > 0);
        assert!(created.metadata.is_empty());

        let updated = store.update_metadata(&lock_id(), 1, metadata("a")).unwrap();
        assert_eq!(updated.metageneration, 2);
        assert_eq!(updated.generation, created.generation);

        let reread = store.get_object_info(&lock_id()).unwrap().unwrap();
        assert_eq!(reread, updated);

        store.delete_object(&lock_id(), 2).unwrap();
        assert!(store.get_object_info(&lock_id()).unwrap().is_none());
    }

    #[test]
    fn test_create_is_no_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsStore::new(temp_dir.path());

        store.create_empty_object(&lock_id()).unwrap();
        store.update_metadata(&lock_id(), 1, metadata("a")).unwrap();

        let err = store.create_empty_object(&lock_id()).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
        let info = store.get_object_info(&lock_id()).unwrap().unwrap();
        assert_eq!(info.metadata, metadata("a"));
    }

    #[test]
    fn test_stale_metageneration_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsStore::new(temp_dir.path());
        store.create_empty_object(&lock_id()).unwrap();
        store.update_metadata(&lock_id(), 1, metadata("a")).unwrap();

        let err = store.update_metadata(&lock_id(), 1, metadata("b")).unwrap_err();
        assert!(matches!(err, StoreError::PreconditionFailed(_)));

        let err = store.delete_object(&lock_id(), 1).unwrap_err();
        assert!(matches!(err, StoreError::PreconditionFailed(_)));
    }

    #[test]
    fn test_update_and_delete_of_missing_object() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsStore::new(temp_dir.path());

        let err = store.update_metadata(&lock_id(), 1, metadata("a")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        let err = store.delete_object(&lock_id(), 1).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_held_guard_reports_busy() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsStore::new(temp_dir.path());
        store.create_empty_object(&lock_id()).unwrap();

        let path = store.object_path(&lock_id()).unwrap();
        let _held = ObjectGuard::acquire(&FsStore::guard_path(&path)).unwrap();

        let err = store.update_metadata(&lock_id(), 1, metadata("a")).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert!(err.to_string().contains("busy"));
    }

    #[test]
    fn test_corrupt_document_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsStore::new(temp_dir.path());
        let path = store.object_path(&lock_id()).unwrap();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        let err = store.get_object_info(&lock_id()).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn test_guard_is_released_after_each_call() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsStore::new(temp_dir.path());
        store.create_empty_object(&lock_id()).unwrap();
        store.update_metadata(&lock_id(), 1, metadata("a")).unwrap();

        let path = store.object_path(&lock_id()).unwrap();
        let _next = ObjectGuard::acquire(&FsStore::guard_path(&path)).unwrap();
    }
}
