//! Command implementations for cooplock.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations against a directory-backed store.

use crate::cli::{Cli, Command, ListArgs, LockArgs, OperationKind, RelockArgs, UnlockArgs};
use chrono::{DateTime, Utc};
use cooplock::config::CooperativeLockingOptions;
use cooplock::coordinator::LockCoordinator;
use cooplock::error::{CoopLockError, Result};
use cooplock::records::{LockRecord, OperationType};
use cooplock::storage::{FsStore, ObjectStore, StorageResourceId};

/// Dispatch a command to its implementation.
pub fn dispatch(cli: Cli) -> Result<()> {
    let options = match &cli.config {
        Some(path) => CooperativeLockingOptions::load(path)?,
        None => CooperativeLockingOptions::default(),
    };
    let coordinator = LockCoordinator::new(FsStore::new(&cli.root), options);

    let output = execute(&coordinator, cli.command, Utc::now())?;
    print!("{}", output);
    Ok(())
}

/// Run `command` and return the text to print.
fn execute<S: ObjectStore>(
    coordinator: &LockCoordinator<S>,
    command: Command,
    now: DateTime<Utc>,
) -> Result<String> {
    match command {
        Command::List(args) => cmd_list(coordinator, args, now),
        Command::Lock(args) => cmd_lock(coordinator, args, now),
        Command::Unlock(args) => cmd_unlock(coordinator, args),
        Command::Relock(args) => cmd_relock(coordinator, args),
    }
}

fn parse_resources(resources: &[String]) -> Result<Vec<StorageResourceId>> {
    resources
        .iter()
        .map(|r| StorageResourceId::parse(r))
        .collect()
}

fn cmd_list<S: ObjectStore>(
    coordinator: &LockCoordinator<S>,
    args: ListArgs,
    now: DateTime<Utc>,
) -> Result<String> {
    let records = coordinator.get_locked_operations(&args.namespace)?;
    Ok(render_lock_list(&args.namespace, &records, now))
}

fn cmd_lock<S: ObjectStore>(
    coordinator: &LockCoordinator<S>,
    args: LockArgs,
    now: DateTime<Utc>,
) -> Result<String> {
    let resources = parse_resources(&args.resources)?;
    let operation_type = match args.operation_type {
        OperationKind::Delete => OperationType::Delete,
        OperationKind::Rename => OperationType::Rename,
    };

    coordinator.lock_paths(&args.operation_id, now, operation_type, &resources)?;

    Ok(format!(
        "Locked {} resource(s) for operation {}.\n",
        resources.len(),
        args.operation_id
    ))
}

fn cmd_unlock<S: ObjectStore>(
    coordinator: &LockCoordinator<S>,
    args: UnlockArgs,
) -> Result<String> {
    let resources = parse_resources(&args.resources)?;

    coordinator.unlock_paths(&args.operation_id, &resources)?;

    Ok(format!(
        "Unlocked {} resource(s) for operation {}.\n",
        resources.len(),
        args.operation_id
    ))
}

fn cmd_relock<S: ObjectStore>(
    coordinator: &LockCoordinator<S>,
    args: RelockArgs,
) -> Result<String> {
    let operation = coordinator
        .get_locked_operations(&args.namespace)?
        .into_iter()
        .find(|r| r.operation_id == args.operation_id)
        .ok_or_else(|| {
            CoopLockError::Consistency(format!("operation {} not found", args.operation_id))
        })?;

    coordinator.relock_operation(&args.namespace, &operation)?;

    Ok(format!(
        "Refreshed lock of operation {} in {}.\n",
        args.operation_id, args.namespace
    ))
}

/// Human-readable listing of a namespace's lock records.
fn render_lock_list(namespace: &str, records: &[LockRecord], now: DateTime<Utc>) -> String {
    if records.is_empty() {
        return format!("No active locks in {}.\n", namespace);
    }

    let mut out = format!("Active locks in {} ({}):\n\n", namespace, records.len());

    for record in records {
        out.push_str(&format!(
            "  {} ({}):\n",
            record.operation_id,
            record.operation_type.as_str()
        ));
        out.push_str(&format!("    Client:     {}\n", record.client_id));
        out.push_str(&format!(
            "    Started:    {}\n",
            record.operation_time.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        out.push_str(&format!(
            "    Expires:    {}\n",
            record.lock_expiration.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        if record.is_expired(now) {
            out.push_str("    Status:     EXPIRED\n");
        }
        let resources: Vec<&str> = record.resources.iter().map(String::as_str).collect();
        out.push_str(&format!("    Resources:  {}\n\n", resources.join(", ")));
    }

    // Summary
    let expired = records.iter().filter(|r| r.is_expired(now)).count();
    if expired > 0 {
        out.push_str(&format!(
            "Note: {} lock(s) are expired. Their owners may have crashed.\n",
            expired
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use clap::Parser;
    use cooplock::storage::MemoryStore;
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap()
    }

    fn command(args: &[&str]) -> Command {
        let argv = std::iter::once("cooplock").chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap().command
    }

    fn coordinator() -> LockCoordinator<Arc<MemoryStore>> {
        LockCoordinator::new(
            Arc::new(MemoryStore::new()),
            CooperativeLockingOptions::default(),
        )
    }

    #[test]
    fn test_list_empty_namespace() {
        let c = coordinator();
        let out = execute(&c, command(&["list", "bucket"]), now()).unwrap();
        assert_eq!(out, "No active locks in bucket.\n");
    }

    #[test]
    fn test_lock_list_unlock() {
        let c = coordinator();

        let out = execute(
            &c,
            command(&[
                "lock",
                "--operation-id",
                "op-1",
                "--operation-type",
                "rename",
                "bucket/src/",
                "bucket/dst/",
            ]),
            now(),
        )
        .unwrap();
        assert_eq!(out, "Locked 2 resource(s) for operation op-1.\n");

        let out = execute(&c, command(&["list", "bucket"]), now()).unwrap();
        assert!(out.contains("Active locks in bucket (1):"));
        assert!(out.contains("op-1 (RENAME):"));
        assert!(out.contains("Resources:  dst/, src/"));
        assert!(!out.contains("EXPIRED"));

        let out = execute(
            &c,
            command(&["unlock", "--operation-id", "op-1", "bucket/dst/", "bucket/src/"]),
            now(),
        )
        .unwrap();
        assert_eq!(out, "Unlocked 2 resource(s) for operation op-1.\n");
        assert!(c.get_locked_operations("bucket").unwrap().is_empty());
    }

    #[test]
    fn test_list_flags_expired_locks() {
        let c = coordinator();
        execute(
            &c,
            command(&["lock", "--operation-id", "op-1", "bucket/dir/a"]),
            now(),
        )
        .unwrap();

        let later = Utc::now() + Duration::hours(1);
        let out = execute(&c, command(&["list", "bucket"]), later).unwrap();
        assert!(out.contains("Status:     EXPIRED"));
        assert!(out.contains("Note: 1 lock(s) are expired."));
    }

    #[test]
    fn test_render_lock_list_layout() {
        let record = LockRecord {
            operation_id: "op-1".to_string(),
            client_id: "host-000001".to_string(),
            operation_type: OperationType::Delete,
            operation_time: now(),
            lock_expiration: now() + Duration::minutes(2),
            resources: ["dir/a".to_string()].into_iter().collect(),
        };

        let out = render_lock_list("bucket", &[record], now());

        assert_eq!(
            out,
            "Active locks in bucket (1):\n\n\
             \x20 op-1 (DELETE):\n\
             \x20   Client:     host-000001\n\
             \x20   Started:    2026-10-19 08:00:00 UTC\n\
             \x20   Expires:    2026-10-19 08:02:00 UTC\n\
             \x20   Resources:  dir/a\n\n"
        );
    }

    #[test]
    fn test_relock_existing_operation() {
        let c = coordinator();
        execute(
            &c,
            command(&["lock", "--operation-id", "op-1", "bucket/dir/a"]),
            now(),
        )
        .unwrap();

        let out = execute(&c, command(&["relock", "bucket", "op-1"]), now()).unwrap();
        assert_eq!(out, "Refreshed lock of operation op-1 in bucket.\n");
    }

    #[test]
    fn test_relock_unknown_operation_fails() {
        let c = coordinator();
        let err = execute(&c, command(&["relock", "bucket", "op-9"]), now()).unwrap_err();
        assert!(matches!(err, CoopLockError::Consistency(_)));
        assert!(err.to_string().contains("operation op-9 not found"));
    }

    #[test]
    fn test_malformed_resource_is_rejected() {
        let c = coordinator();
        let err = execute(
            &c,
            command(&["lock", "--operation-id", "op-1", "no-namespace"]),
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, CoopLockError::Validation(_)));
    }
}
