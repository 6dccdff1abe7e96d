//! Core data types for mediasync
//!
//! This module provides the records exchanged with listing hosts and the
//! per-host synchronization state kept by the reconciler.

use crate::Fingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeSet, HashSet};

/// Set of file paths served by one host
pub type PathSet = HashSet<String>;

/// One file as reported by a listing host
///
/// Identity is `path`; `name` and `size` are carried along for indexing but
/// never participate in change detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRecord {
    /// Full path of the file on its host
    pub path: String,
    /// Final path component
    pub name: String,
    /// Size in bytes
    pub size: u64,
}

impl FileRecord {
    /// Create a new file record
    pub fn new(path: impl Into<String>, name: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            size,
        }
    }
}

/// A registered listing host
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostEndpoint {
    /// Registry name, used as the key for sync state and indexed entries
    pub name: String,
    /// Base URL of the listing service, e.g. `http://nas:8080`
    pub url: String,
}

impl HostEndpoint {
    /// Create a new host endpoint
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// URL of an endpoint on this host
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

/// Persisted reconciliation state for one host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSyncState {
    /// Registry name of the host
    pub host_name: String,
    /// Fingerprint observed at the last successful reconciliation
    pub last_fingerprint: Option<Fingerprint>,
    /// Path set applied to the index at the last successful reconciliation
    #[serde(serialize_with = "serialize_sorted", default)]
    pub last_path_set: PathSet,
    /// When the last successful reconciliation finished
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl HostSyncState {
    /// State of a host that has never been reconciled
    pub fn new(host_name: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
            last_fingerprint: None,
            last_path_set: PathSet::new(),
            last_synced_at: None,
        }
    }

    /// Whether `fingerprint` matches the last reconciled one
    pub fn is_current(&self, fingerprint: &Fingerprint) -> bool {
        self.last_fingerprint.as_ref() == Some(fingerprint)
    }

    /// The state after a successful reconciliation to `path_set`
    pub fn advance(self, fingerprint: Fingerprint, path_set: PathSet) -> Self {
        Self {
            host_name: self.host_name,
            last_fingerprint: Some(fingerprint),
            last_path_set: path_set,
            last_synced_at: Some(Utc::now()),
        }
    }
}

fn serialize_sorted<S: Serializer>(set: &PathSet, serializer: S) -> Result<S::Ok, S::Error> {
    set.iter().collect::<BTreeSet<_>>().serialize(serializer)
}
