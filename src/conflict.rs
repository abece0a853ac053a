//! Hierarchical conflict detection between resource sets.
//!
//! Resource paths form a `/`-delimited hierarchy. Two paths conflict when they
//! are equal or when one is an ancestor directory of the other, so locking a
//! directory implicitly locks everything below it and vice versa.
//!
//! The check is a pairwise scan of every candidate path against every locked
//! path. The number of locked sets is bounded by the configured maximum of
//! concurrent operations.

use std::collections::BTreeSet;

/// Delimiter of the resource path hierarchy.
pub const PATH_DELIMITER: char = '/';

/// Whether `child` lies below directory `parent`.
///
/// `parent` is normalized to end with the delimiter before the prefix test,
/// so `dir` and `dir/` are both ancestors of `dir/a`, and `dir/` itself
/// counts as lying below `dir`.
pub fn is_child_object(child: &str, parent: &str) -> bool {
    if parent.ends_with(PATH_DELIMITER) {
        child.starts_with(parent)
    } else {
        child
            .strip_prefix(parent)
            .is_some_and(|rest| rest.starts_with(PATH_DELIMITER))
    }
}

/// Whether two resource paths overlap.
pub fn paths_conflict(a: &str, b: &str) -> bool {
    a == b || is_child_object(a, b) || is_child_object(b, a)
}

/// Whether `candidate` overlaps any resource of the already locked sets.
pub fn conflicts<'a, I>(locked: I, candidate: &BTreeSet<String>) -> bool
where
    I: IntoIterator<Item = &'a BTreeSet<String>>,
{
    locked.into_iter().flatten().any(|locked_path| {
        candidate
            .iter()
            .any(|path| paths_conflict(path, locked_path))
    })
}
