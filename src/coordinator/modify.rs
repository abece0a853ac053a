//! The optimistic read-modify-write loop shared by all mutating operations.
//!
//! Each iteration:
//! 1. reads the lock file, creating it empty if absent
//! 2. decodes the record set (or starts an empty one)
//! 3. applies the mutation
//! 4. deletes the lock file if no records remain, otherwise writes the
//!    record set back conditioned on the metageneration read in step 1
//!
//! A mutation that cannot apply yet, or a record set over the configured
//! capacity, sleeps the fixed retry interval. A lost race or store failure
//! sleeps the exponential backoff. Nothing from an iteration is reused by
//! the next one.

use super::{LockCoordinator, lock_file_id};
use crate::backoff::ExponentialBackoff;
use crate::error::Result;
use crate::logging::LogThrottle;
use crate::records::{LOCK_METADATA_KEY, LockRecordSet};
use crate::storage::{ObjectInfo, ObjectStore, StorageResourceId, StoreError, StoreResult};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Outcome of one loop iteration that did not hit a fatal error.
#[derive(Debug)]
enum Attempt {
    /// The change is durable.
    Committed,
    /// The mutation could not be applied to this snapshot.
    NotApplied { records: usize },
    /// Applying the mutation would exceed the record-count bound.
    OverCapacity { records: usize },
    /// A store call failed; the snapshot may be stale.
    StoreFailed(StoreError),
}

/// One throttle per kind of retry message.
struct RetryLogThrottles {
    not_applied: LogThrottle,
    over_capacity: LogThrottle,
    precondition: LogThrottle,
    not_found: LogThrottle,
    failure: LogThrottle,
}

impl RetryLogThrottles {
    fn new(interval: Duration) -> Self {
        Self {
            not_applied: LogThrottle::new(interval),
            over_capacity: LogThrottle::new(interval),
            precondition: LogThrottle::new(interval),
            not_found: LogThrottle::new(interval),
            failure: LogThrottle::new(interval),
        }
    }
}

/// Decode the record set stored in a lock file's metadata.
///
/// Metadata that was never versioned, or lacks the record entry, is an empty
/// record set at the current format version.
pub(super) fn read_records(info: &ObjectInfo) -> Result<LockRecordSet> {
    match info.metadata.get(LOCK_METADATA_KEY) {
        Some(json) if info.metageneration != 0 => LockRecordSet::from_json(json),
        _ => Ok(LockRecordSet::new()),
    }
}

impl<S: ObjectStore> LockCoordinator<S> {
    /// Apply `modification` to the namespace's record set until it commits.
    ///
    /// There is no limit on attempts or elapsed time. Only fatal errors, from
    /// decoding or from the mutation itself, end the loop early.
    pub(super) fn modify_lock<F>(
        &self,
        namespace: &str,
        operation_id: &str,
        mut modification: F,
    ) -> Result<()>
    where
        F: FnMut(&mut LockRecordSet) -> Result<bool>,
    {
        let started = Instant::now();
        let lock_id = lock_file_id(namespace);
        let mut backoff = ExponentialBackoff::from_options(&self.options);
        let mut throttles = RetryLogThrottles::new(self.options.log_throttle());

        loop {
            match self.try_modify(&lock_id, &mut modification)? {
                Attempt::Committed => {
                    debug!(
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        operation_id,
                        lock = %lock_id,
                        "updated lock file"
                    );
                    return Ok(());
                }
                Attempt::NotApplied { records } => {
                    if let Some(suppressed) = throttles.not_applied.check() {
                        info!(
                            operation_id,
                            lock = %lock_id,
                            records,
                            suppressed,
                            "failed to update entries: resources could be locked, retrying"
                        );
                    }
                    self.sleeper.sleep(self.options.retry_lock_interval());
                }
                Attempt::OverCapacity { records } => {
                    if let Some(suppressed) = throttles.over_capacity.check() {
                        info!(
                            operation_id,
                            lock = %lock_id,
                            records,
                            max = self.options.max_concurrent_operations,
                            suppressed,
                            "skipping lock entries update: too many locked operations, retrying"
                        );
                    }
                    self.sleeper.sleep(self.options.retry_lock_interval());
                }
                Attempt::StoreFailed(err) => {
                    log_store_failure(&mut throttles, operation_id, &lock_id, &err);
                    self.sleeper.sleep(backoff.next_backoff());
                }
            }
        }
    }

    fn try_modify<F>(&self, lock_id: &StorageResourceId, modification: &mut F) -> Result<Attempt>
    where
        F: FnMut(&mut LockRecordSet) -> Result<bool>,
    {
        let info = match self.read_or_create(lock_id) {
            Ok(info) => info,
            Err(err) => return Ok(Attempt::StoreFailed(err)),
        };

        let mut records = read_records(&info)?;
        if !modification(&mut records)? {
            return Ok(Attempt::NotApplied {
                records: records.len(),
            });
        }

        // No locks left: remove the lock file rather than keep an empty one.
        if records.is_empty() {
            return Ok(
                match self.store.delete_object(lock_id, info.metageneration) {
                    Ok(()) => Attempt::Committed,
                    Err(err) => Attempt::StoreFailed(err),
                },
            );
        }

        if records.len() > self.options.max_concurrent_operations {
            return Ok(Attempt::OverCapacity {
                records: records.len(),
            });
        }

        let mut metadata = info.metadata;
        metadata.insert(LOCK_METADATA_KEY.to_string(), records.to_json()?);

        Ok(
            match self
                .store
                .update_metadata(lock_id, info.metageneration, metadata)
            {
                Ok(_) => Attempt::Committed,
                Err(err) => Attempt::StoreFailed(err),
            },
        )
    }

    fn read_or_create(&self, lock_id: &StorageResourceId) -> StoreResult<ObjectInfo> {
        if let Some(info) = self.store.get_object_info(lock_id)? {
            return Ok(info);
        }

        match self.store.create_empty_object(lock_id) {
            Err(err) if err.is_transient() => return Err(err),
            _ => {}
        }

        // Another caller may delete the fresh object before we read it.
        self.store
            .get_object_info(lock_id)?
            .ok_or_else(|| StoreError::NotFound(lock_id.to_string()))
    }
}

fn log_store_failure(
    throttles: &mut RetryLogThrottles,
    operation_id: &str,
    lock_id: &StorageResourceId,
    err: &StoreError,
) {
    match err {
        StoreError::PreconditionFailed(_) => {
            if let Some(suppressed) = throttles.precondition.check() {
                info!(
                    operation_id,
                    lock = %lock_id,
                    suppressed,
                    "failed to update entries (condition not met), retrying"
                );
            }
        }
        StoreError::NotFound(_) => {
            if let Some(suppressed) = throttles.not_found.check() {
                info!(
                    operation_id,
                    lock = %lock_id,
                    suppressed,
                    "failed to update entries (file not found), retrying"
                );
            }
        }
        _ => {
            if let Some(suppressed) = throttles.failure.check() {
                warn!(
                    operation_id,
                    lock = %lock_id,
                    error = %err,
                    suppressed,
                    "failed to modify lock, retrying"
                );
            }
        }
    }
}
