//! Path set difference detection
//!
//! Change detection works on path membership only. A path present in both
//! snapshots is unchanged, whatever happened to its size or content.

use mediasync_types::{FileRecord, PathSet};
use std::collections::HashMap;
use tracing::debug;

/// Paths added and removed between two snapshots of one host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathDiff {
    /// Paths present only in the new snapshot
    pub added: PathSet,
    /// Paths present only in the old snapshot
    pub removed: PathSet,
}

impl PathDiff {
    /// Whether the snapshots are identical
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Compute `new - old` and `old - new`
pub fn diff(old_paths: &PathSet, new_paths: &PathSet) -> PathDiff {
    PathDiff {
        added: new_paths.difference(old_paths).cloned().collect(),
        removed: old_paths.difference(new_paths).cloned().collect(),
    }
}

/// Mutations needed to bring one host's indexed entries up to date
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Records to add, sorted by path
    pub added: Vec<FileRecord>,
    /// Paths to remove, sorted
    pub removed: Vec<String>,
    /// Path set of the new listing, to be stored once the plan is applied
    pub path_set: PathSet,
}

impl SyncPlan {
    /// Whether applying the plan changes nothing
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Diff a fresh listing against the stored path set and resolve added paths
/// back to their records
///
/// If a host lists the same path twice, the first record wins.
pub fn plan(old_paths: &PathSet, listing: Vec<FileRecord>) -> SyncPlan {
    let mut records: HashMap<String, FileRecord> = HashMap::with_capacity(listing.len());
    for record in listing {
        records.entry(record.path.clone()).or_insert(record);
    }

    let path_set: PathSet = records.keys().cloned().collect();
    let changes = diff(old_paths, &path_set);

    let mut added: Vec<FileRecord> = changes
        .added
        .iter()
        .filter_map(|path| records.remove(path))
        .collect();
    added.sort_by(|a, b| a.path.cmp(&b.path));

    let mut removed: Vec<String> = changes.removed.into_iter().collect();
    removed.sort();

    debug!(
        "Planned {} additions and {} removals over {} listed paths",
        added.len(),
        removed.len(),
        path_set.len()
    );

    SyncPlan {
        added,
        removed,
        path_set,
    }
}
