//! Core traits for mediasync
//!
//! The reconciler talks to the outside world through exactly two seams: a
//! client for listing hosts and an adapter for the persisted index. Both are
//! object safe so the reconciler can hold them as `Arc<dyn ...>`.

use crate::{FileRecord, Fingerprint, HostEndpoint, HostSyncState, PathSet, Result};
use async_trait::async_trait;

/// Client side of the listing host wire contract
#[async_trait]
pub trait HostClient: Send + Sync {
    /// Fetch the host's current fingerprint from its health endpoint
    async fn fetch_fingerprint(&self, host: &HostEndpoint) -> Result<Fingerprint>;

    /// Fetch the host's full file listing
    async fn fetch_listing(&self, host: &HostEndpoint) -> Result<Vec<FileRecord>>;
}

/// Narrow interface to the persisted index
///
/// `add_entry` and `remove_entry` must be idempotent: adding an entry that is
/// already present, or removing one that is absent, succeeds without effect.
#[async_trait]
pub trait IndexAdapter: Send + Sync {
    /// Add (or overwrite) the entry for `record` under `host`
    async fn add_entry(&self, host: &str, record: &FileRecord) -> Result<()>;

    /// Remove the entry for `path` under `host`
    async fn remove_entry(&self, host: &str, path: &str) -> Result<()>;

    /// Load the sync state of `host`, if it was ever reconciled
    async fn get_host_state(&self, host: &str) -> Result<Option<HostSyncState>>;

    /// Durably replace the sync state of `host`
    ///
    /// On failure the previously stored state must remain in effect.
    async fn set_host_state(&self, host: &str, state: HostSyncState) -> Result<()>;

    /// Paths currently indexed under `host`, whatever the stored state says
    async fn host_entry_paths(&self, host: &str) -> Result<PathSet>;
}
