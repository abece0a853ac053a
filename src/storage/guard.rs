//! Exclusive guard files serializing compare-and-swap on one object.
//!
//! A guard is a sibling file holding an exclusive advisory lock. The lock
//! belongs to the open file handle, so it is released when the guard is
//! dropped or its process dies. The file itself is never deleted: removing
//! it would let a later caller lock a fresh inode while an earlier holder
//! still owns the old one.

use super::types::StoreError;
use super::StoreResult;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use tracing::warn;

/// RAII guard for an object's guard file.
///
/// When dropped, the advisory lock is released. If unlocking fails a warning
/// is logged; closing the handle releases the lock regardless.
#[derive(Debug)]
pub(super) struct ObjectGuard {
    file: File,
}

impl ObjectGuard {
    /// Take the guard at `path`.
    ///
    /// A guard held by another handle yields [`StoreError::Io`], which the
    /// coordinator treats as transient.
    pub(super) fn acquire(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::Io(format!(
                    "failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| {
                StoreError::Io(format!("failed to open guard '{}': {}", path.display(), e))
            })?;

        file.try_lock_exclusive().map_err(|e| {
            if e.kind() == fs2::lock_contended_error().kind() {
                StoreError::Io(format!("'{}' is busy", path.display()))
            } else {
                StoreError::Io(format!(
                    "failed to lock guard '{}': {}",
                    path.display(),
                    e
                ))
            }
        })?;

        Ok(Self { file })
    }
}

impl Drop for ObjectGuard {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(error = %e, "failed to release guard file");
        }
    }
}
