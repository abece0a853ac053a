//! Record set mutations applied inside the modification loop.
//!
//! Each mutation edits the freshly read record set in place and reports
//! whether the change could be applied to that snapshot. `Ok(false)` means
//! "retry later"; errors are fatal.

use super::LockCoordinator;
use crate::conflict::conflicts;
use crate::error::{CoopLockError, Result};
use crate::records::{LockRecord, LockRecordSet, OperationType};
use crate::storage::{ObjectStore, StorageResourceId};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::debug;

/// Check a resource list and split it into namespace and object names.
pub(super) fn validate_resources(
    resources: &[StorageResourceId],
) -> Result<(String, BTreeSet<String>)> {
    let Some(first) = resources.first() else {
        return Err(CoopLockError::Validation(
            "resources should not be empty".to_string(),
        ));
    };

    if let Some(other) = resources.iter().find(|r| r.namespace != first.namespace) {
        return Err(CoopLockError::Validation(format!(
            "all resources should be in the same namespace, but found '{}' and '{}'",
            first.namespace, other.namespace
        )));
    }

    if resources.iter().any(|r| r.object_name.is_empty()) {
        return Err(CoopLockError::Validation(
            "resource object names should not be empty".to_string(),
        ));
    }

    let objects = resources.iter().map(|r| r.object_name.clone()).collect();
    Ok((first.namespace.clone(), objects))
}

pub(super) fn format_resources(resources: &BTreeSet<String>) -> String {
    format!(
        "[{}]",
        resources
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    )
}

/// Remove the single record holding exactly `resources` for `operation_id`.
pub(super) fn remove_lock_records(
    records: &mut LockRecordSet,
    operation_id: &str,
    resources: &BTreeSet<String>,
) -> Result<bool> {
    let matching: Vec<usize> = records
        .locks
        .iter()
        .enumerate()
        .filter(|(_, record)| record.covers_any(resources))
        .map(|(index, _)| index)
        .collect();

    if matching.len() != 1 {
        let found = matching
            .iter()
            .map(|&index| records.locks[index].to_string())
            .collect::<Vec<_>>();
        return Err(CoopLockError::Consistency(format!(
            "only {} operation with {} resources should be unlocked, but found {} operations: [{}]",
            operation_id,
            format_resources(resources),
            matching.len(),
            found.join("; ")
        )));
    }

    let index = matching[0];
    let record = &records.locks[index];
    if record.operation_id != operation_id {
        return Err(CoopLockError::Consistency(format!(
            "all resources should be locked by {} operation, but they are locked by {} operation",
            operation_id, record.operation_id
        )));
    }
    if record.resources != *resources {
        return Err(CoopLockError::Consistency(format!(
            "all of {} resources should be locked by {} operation, but it locked {} resources",
            format_resources(resources),
            operation_id,
            format_resources(&record.resources)
        )));
    }

    records.locks.remove(index);
    Ok(true)
}

impl<S: ObjectStore> LockCoordinator<S> {
    /// Append a record for `operation_id` unless a requested path overlaps a
    /// locked one.
    pub(super) fn add_lock_record(
        &self,
        records: &mut LockRecordSet,
        operation_id: &str,
        operation_time: DateTime<Utc>,
        operation_type: OperationType,
        resources: &BTreeSet<String>,
    ) -> Result<bool> {
        if let Some(existing) = records.find_operation(operation_id) {
            // A previous attempt of this call may have committed even though
            // its write reported a failure.
            if existing.resources == *resources {
                debug!(operation_id, "operation already holds the requested lock");
                return Ok(true);
            }
            return Err(CoopLockError::Consistency(format!(
                "operation {} already holds {} resources and cannot also lock {}",
                operation_id,
                format_resources(&existing.resources),
                format_resources(resources)
            )));
        }

        if conflicts(records.locks.iter().map(|r| &r.resources), resources) {
            return Ok(false);
        }

        let now = self.clock.now();
        let lock_expiration = self.options.lock_expiration_after(now)?;
        records.locks.push(LockRecord {
            operation_id: operation_id.to_string(),
            client_id: self.client_ids.new_client_id(operation_id)?,
            operation_type,
            operation_time,
            lock_expiration,
            resources: resources.clone(),
        });
        Ok(true)
    }

    /// Give the record equal to `operation` a new client id and expiration.
    pub(super) fn reacquire_operation_lock(
        &self,
        records: &mut LockRecordSet,
        operation: &LockRecord,
    ) -> Result<bool> {
        let Some(record) = records.locks.iter_mut().find(|r| **r == *operation) else {
            return Err(CoopLockError::Consistency(format!(
                "operation {} not found",
                operation.operation_id
            )));
        };

        record.lock_expiration = self.options.lock_expiration_after(self.clock.now())?;
        record.client_id = self.client_ids.new_client_id(&operation.operation_id)?;
        Ok(true)
    }
}
