//! CLI argument parsing for cooplock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Cooplock: cooperative, lease-based locking of resource paths.
///
/// Locks are recorded in `<namespace>/_lock/all.lock` under the store root.
/// Every process sharing that root takes part in the same protocol.
#[derive(Parser, Debug)]
#[command(name = "cooplock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Root directory of the object store.
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// YAML file with locking options.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for cooplock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the active locks of a namespace.
    ///
    /// Expired locks are listed too and flagged; nothing removes them.
    List(ListArgs),

    /// Lock resources for an operation.
    ///
    /// Blocks until no requested path overlaps a locked one.
    Lock(LockArgs),

    /// Release the lock an operation holds on exactly the given resources.
    Unlock(UnlockArgs),

    /// Refresh the expiration of an operation's lock.
    Relock(RelockArgs),
}

/// Arguments for the `list` command.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Namespace whose lock file is read.
    pub namespace: String,
}

/// Arguments for the `lock` command.
#[derive(Args, Debug)]
pub struct LockArgs {
    /// Stable id of the operation taking the lock.
    #[arg(long)]
    pub operation_id: String,

    /// Kind of operation being protected.
    #[arg(long, value_enum, default_value_t = OperationKind::Delete)]
    pub operation_type: OperationKind,

    /// Resources to lock, as `<namespace>/<object>`.
    #[arg(required = true)]
    pub resources: Vec<String>,
}

/// Arguments for the `unlock` command.
#[derive(Args, Debug)]
pub struct UnlockArgs {
    /// Operation that holds the lock.
    #[arg(long)]
    pub operation_id: String,

    /// Resources to release, as `<namespace>/<object>`.
    #[arg(required = true)]
    pub resources: Vec<String>,
}

/// Arguments for the `relock` command.
#[derive(Args, Debug)]
pub struct RelockArgs {
    /// Namespace whose lock file holds the operation.
    pub namespace: String,

    /// Operation whose lock is refreshed.
    pub operation_id: String,
}

/// Operation kinds accepted on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
    Delete,
    Rename,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
