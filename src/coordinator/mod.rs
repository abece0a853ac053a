//! Lock coordination over a shared lock file.
//!
//! The coordinator implements cooperative, lease-based locking of resource
//! paths without a lock server. Every caller races to read-modify-write the
//! same record set stored in the metadata of `{namespace}/_lock/all.lock`;
//! the store's conditional update on the object's metageneration is the sole
//! source of mutual exclusion.
//!
//! # Operations
//!
//! - [`lock_paths`](LockCoordinator::lock_paths): add a record once none of
//!   the requested paths overlaps a locked one
//! - [`unlock_paths`](LockCoordinator::unlock_paths): remove the record holding
//!   exactly the given paths
//! - [`relock_operation`](LockCoordinator::relock_operation): heartbeat that
//!   refreshes a record's client id and expiration
//! - [`get_locked_operations`](LockCoordinator::get_locked_operations):
//!   read-only listing
//!
//! The first three retry until they commit or hit a fatal error; callers that
//! need bounded latency must enforce their own deadline.

mod modify;
mod mutations;


use crate::backoff::{Sleeper, ThreadSleeper};
use crate::client_id::{ClientIdProvider, HostClientIdProvider};
use crate::clock::{Clock, SystemClock};
use crate::config::CooperativeLockingOptions;
use crate::error::Result;
use crate::records::{LOCK_PATH, LockRecord, OperationType};
use crate::storage::{ObjectStore, StorageResourceId};
use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::debug;

/// Id of the lock file holding the record set of `namespace`.
pub fn lock_file_id(namespace: &str) -> StorageResourceId {
    StorageResourceId::new(namespace, LOCK_PATH)
}

/// Drives lock record modifications against an [`ObjectStore`].
pub struct LockCoordinator<S: ObjectStore> {
    store: S,
    options: CooperativeLockingOptions,
    client_ids: Box<dyn ClientIdProvider>,
    clock: Box<dyn Clock>,
    sleeper: Box<dyn Sleeper>,
}

impl<S: ObjectStore> std::fmt::Debug for LockCoordinator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockCoordinator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<S: ObjectStore> LockCoordinator<S> {
    /// Coordinator using host-derived client ids, the system clock and real
    /// thread sleeps.
    pub fn new(store: S, options: CooperativeLockingOptions) -> Self {
        Self::with_parts(
            store,
            options,
            Box::new(HostClientIdProvider),
            Box::new(SystemClock),
            Box::new(ThreadSleeper),
        )
    }

    /// Coordinator with every collaborator supplied by the caller.
    pub fn with_parts(
        store: S,
        options: CooperativeLockingOptions,
        client_ids: Box<dyn ClientIdProvider>,
        clock: Box<dyn Clock>,
        sleeper: Box<dyn Sleeper>,
    ) -> Self {
        Self {
            store,
            options,
            client_ids,
            clock,
            sleeper,
        }
    }

    pub fn options(&self) -> &CooperativeLockingOptions {
        &self.options
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// List the active lock records of `namespace`.
    ///
    /// A missing lock file, or one without versioned record metadata, means no
    /// locks are held. Store errors are returned as-is; there is no retry.
    pub fn get_locked_operations(&self, namespace: &str) -> Result<Vec<LockRecord>> {
        let started = Instant::now();
        let lock_id = lock_file_id(namespace);

        let operations = match self.store.get_object_info(&lock_id)? {
            Some(info) => modify::read_records(&info)?.locks,
            None => Vec::new(),
        };

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            namespace,
            count = operations.len(),
            "get_locked_operations"
        );
        Ok(operations)
    }

    /// Lock `resources` on behalf of `operation_id`.
    ///
    /// All resources must belong to one namespace. Blocks, retrying, while any
    /// requested path equals, contains or lies below a path locked by another
    /// operation.
    pub fn lock_paths(
        &self,
        operation_id: &str,
        operation_time: DateTime<Utc>,
        operation_type: OperationType,
        resources: &[StorageResourceId],
    ) -> Result<()> {
        let started = Instant::now();
        let (namespace, objects) = mutations::validate_resources(resources)?;

        self.modify_lock(&namespace, operation_id, |records| {
            self.add_lock_record(records, operation_id, operation_time, operation_type, &objects)
        })?;

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            operation_id,
            resources = %mutations::format_resources(&objects),
            "lock_paths"
        );
        Ok(())
    }

    /// Release the lock `operation_id` holds on exactly `resources`.
    ///
    /// Partial release is not supported: the resources must equal the set the
    /// lock was created with.
    pub fn unlock_paths(&self, operation_id: &str, resources: &[StorageResourceId]) -> Result<()> {
        let started = Instant::now();
        let (namespace, objects) = mutations::validate_resources(resources)?;

        self.modify_lock(&namespace, operation_id, |records| {
            mutations::remove_lock_records(records, operation_id, &objects)
        })?;

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            operation_id,
            resources = %mutations::format_resources(&objects),
            "unlock_paths"
        );
        Ok(())
    }

    /// Refresh the client id and expiration of a held lock.
    ///
    /// Fails with a consistency error if the record is gone, e.g. because it
    /// expired and was reclaimed.
    pub fn relock_operation(&self, namespace: &str, operation: &LockRecord) -> Result<()> {
        let started = Instant::now();

        self.modify_lock(namespace, &operation.operation_id, |records| {
            self.reacquire_operation_lock(records, operation)
        })?;

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            operation_id = %operation.operation_id,
            client_id = %operation.client_id,
            "relock_operation"
        );
        Ok(())
    }
}
