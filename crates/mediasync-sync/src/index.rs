//! Persisted index of remote media entries
//!
//! [`IndexStore`] is the local document store the reconciler mutates through
//! [`IndexAdapter`]. Entries and per-host sync state live in one JSON
//! document. Writing a host's sync state persists the whole document, so a
//! state update is never durable without the entry mutations that preceded
//! it.

use async_trait::async_trait;
use mediasync_types::{Error, FileRecord, HostSyncState, IndexAdapter, PathSet, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// One indexed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Stable identifier, `<host>:<path>`
    pub id: String,
    /// Registry name of the host serving the file
    pub host: String,
    /// Path of the file on that host
    pub path: String,
    /// File name, the searchable text of the entry
    pub name: String,
    /// Size in bytes when first indexed
    pub size: u64,
}

impl IndexEntry {
    /// Build the entry for `record` served by `host`
    pub fn new(host: &str, record: &FileRecord) -> Self {
        Self {
            id: Self::id_for(host, &record.path),
            host: host.to_string(),
            path: record.path.clone(),
            name: record.name.clone(),
            size: record.size,
        }
    }

    /// Identifier of the entry for `path` on `host`
    pub fn id_for(host: &str, path: &str) -> String {
        format!("{host}:{path}")
    }
}

/// A search result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Matching entry
    pub entry: IndexEntry,
    /// Number of query tokens found in the entry name
    pub score: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexDocument {
    #[serde(default)]
    entries: BTreeMap<String, IndexEntry>,
    #[serde(default)]
    hosts: BTreeMap<String, HostSyncState>,
}

#[derive(Debug, Default)]
struct StoreState {
    document: IndexDocument,
    dirty: bool,
}

/// JSON-backed index store
#[derive(Debug)]
pub struct IndexStore {
    path: Option<PathBuf>,
    state: RwLock<StoreState>,
}

impl IndexStore {
    /// Open the store at `path`, starting empty if the file does not exist
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        let document = Self::load(&path).await?;

        info!(
            "Opened index '{}' with {} entries for {} hosts",
            path.display(),
            document.entries.len(),
            document.hosts.len()
        );

        Ok(Self {
            path: Some(path),
            state: RwLock::new(StoreState {
                document,
                dirty: false,
            }),
        })
    }

    /// A store that is never written to disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Location of the backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of indexed entries
    pub async fn len(&self) -> usize {
        self.state.read().await.document.entries.len()
    }

    /// Whether the index holds no entries
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// All entries served by `host`, ordered by path
    pub async fn entries_for_host(&self, host: &str) -> Vec<IndexEntry> {
        let state = self.state.read().await;
        let mut entries: Vec<IndexEntry> = state
            .document
            .entries
            .values()
            .filter(|entry| entry.host == host)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries
    }

    /// Sync state of every host ever reconciled, ordered by host name
    pub async fn host_states(&self) -> Vec<HostSyncState> {
        self.state.read().await.document.hosts.values().cloned().collect()
    }

    /// Rank entries by how many query tokens their names contain
    ///
    /// Matching is case-insensitive. Ties are broken by entry id so results
    /// are stable.
    pub async fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let terms: HashSet<String> = tokenize(query).collect();
        if terms.is_empty() || limit == 0 {
            return Vec::new();
        }

        let state = self.state.read().await;
        let mut hits: Vec<SearchHit> = state
            .document
            .entries
            .values()
            .filter_map(|entry| {
                let tokens: Vec<String> = tokenize(&entry.name).collect();
                let score = terms
                    .iter()
                    .filter(|term| tokens.iter().any(|token| token.contains(term.as_str())))
                    .count();
                (score > 0).then(|| SearchHit {
                    entry: entry.clone(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.entry.id.cmp(&b.entry.id)));
        hits.truncate(limit);
        hits
    }

    /// Write pending changes to disk
    pub async fn save(&self) -> Result<()> {
        let mut state = self.state.write().await;
        self.persist(&mut state).await
    }

    async fn load(path: &Path) -> Result<IndexDocument> {
        if !path.exists() {
            debug!("Index file does not exist, starting with empty index");
            return Ok(IndexDocument::default());
        }

        let data = fs::read(path).await.map_err(|e| Error::Io {
            message: format!("Failed to read index file '{}': {}", path.display(), e),
        })?;

        serde_json::from_slice(&data).map_err(|e| {
            Error::serialization(format!(
                "Failed to parse index file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    async fn persist(&self, state: &mut StoreState) -> Result<()> {
        let Some(path) = &self.path else {
            state.dirty = false;
            return Ok(());
        };
        if !state.dirty {
            return Ok(());
        }

        let data = serde_json::to_vec_pretty(&state.document)
            .map_err(|e| Error::serialization(format!("Failed to serialize index: {e}")))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| Error::Io {
                message: format!("Failed to create directory '{}': {}", parent.display(), e),
            })?;
        }

        // Write-then-rename keeps the previous document intact on failure
        let temp = path.with_extension("json.tmp");
        fs::write(&temp, data).await.map_err(|e| Error::Io {
            message: format!("Failed to write index file '{}': {}", temp.display(), e),
        })?;
        fs::rename(&temp, path).await.map_err(|e| Error::Io {
            message: format!("Failed to replace index file '{}': {}", path.display(), e),
        })?;

        state.dirty = false;
        debug!(
            "Saved index to disk with {} entries",
            state.document.entries.len()
        );
        Ok(())
    }
}

#[async_trait]
impl IndexAdapter for IndexStore {
    async fn add_entry(&self, host: &str, record: &FileRecord) -> Result<()> {
        let entry = IndexEntry::new(host, record);
        let mut state = self.state.write().await;
        if state.document.entries.get(&entry.id) != Some(&entry) {
            debug!("Indexed {}", entry.id);
            state.document.entries.insert(entry.id.clone(), entry);
            state.dirty = true;
        }
        Ok(())
    }

    async fn remove_entry(&self, host: &str, path: &str) -> Result<()> {
        let id = IndexEntry::id_for(host, path);
        let mut state = self.state.write().await;
        if state.document.entries.remove(&id).is_some() {
            debug!("Removed {}", id);
            state.dirty = true;
        }
        Ok(())
    }

    async fn get_host_state(&self, host: &str) -> Result<Option<HostSyncState>> {
        Ok(self.state.read().await.document.hosts.get(host).cloned())
    }

    async fn set_host_state(&self, host: &str, host_state: HostSyncState) -> Result<()> {
        let mut state = self.state.write().await;
        let previous = state.document.hosts.insert(host.to_string(), host_state);
        state.dirty = true;

        if let Err(error) = self.persist(&mut state).await {
            match previous {
                Some(previous) => state.document.hosts.insert(host.to_string(), previous),
                None => state.document.hosts.remove(host),
            };
            return Err(error);
        }
        Ok(())
    }

    async fn host_entry_paths(&self, host: &str) -> Result<PathSet> {
        let state = self.state.read().await;
        Ok(state
            .document
            .entries
            .values()
            .filter(|entry| entry.host == host)
            .map(|entry| entry.path.clone())
            .collect())
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediasync_types::Fingerprint;
    use tempfile::TempDir;

    fn record(path: &str) -> FileRecord {
        let name = path.rsplit('/').next().unwrap_or(path);
        FileRecord::new(path, name, 1024)
    }

    #[tokio::test]
    async fn test_add_and_remove_are_idempotent() {
        let store = IndexStore::in_memory();

        store.add_entry("nas", &record("/m/a.mkv")).await.unwrap();
        store.add_entry("nas", &record("/m/a.mkv")).await.unwrap();
        assert_eq!(store.len().await, 1);

        store.remove_entry("nas", "/m/a.mkv").await.unwrap();
        store.remove_entry("nas", "/m/a.mkv").await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_entries_are_scoped_by_host() {
        let store = IndexStore::in_memory();
        store.add_entry("nas", &record("/m/a.mkv")).await.unwrap();
        store.add_entry("pi", &record("/m/a.mkv")).await.unwrap();

        assert_eq!(store.len().await, 2);
        let entries = store.entries_for_host("pi").await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "pi:/m/a.mkv");
    }

    #[tokio::test]
    async fn test_search_ranks_by_token_overlap() {
        let store = IndexStore::in_memory();
        for path in [
            "/m/The.Matrix.1999.mkv",
            "/m/The.Matrix.Reloaded.2003.mkv",
            "/m/Alien.1979.mkv",
        ] {
            store.add_entry("nas", &record(path)).await.unwrap();
        }

        let hits = store.search("matrix reloaded", 10).await;
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].entry.name, "The.Matrix.Reloaded.2003.mkv");
        assert_eq!(hits[0].score, 2);

        assert_eq!(store.search("MATRIX", 1).await.len(), 1);
        assert!(store.search("   ", 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_persistence_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index").join("index.json");

        {
            let store = IndexStore::open(&path).await.unwrap();
            store.add_entry("nas", &record("/m/a.mkv")).await.unwrap();
            let state = HostSyncState::new("nas").advance(
                Fingerprint::of_paths(["/m/a.mkv"]),
                PathSet::from(["/m/a.mkv".to_string()]),
            );
            store.set_host_state("nas", state).await.unwrap();
        }

        let store = IndexStore::open(&path).await.unwrap();
        assert_eq!(store.len().await, 1);
        let state = store.get_host_state("nas").await.unwrap().unwrap();
        assert!(state.is_current(&Fingerprint::of_paths(["/m/a.mkv"])));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_failed_state_write_keeps_previous_state() {
        let temp_dir = TempDir::new().unwrap();
        let index_dir = temp_dir.path().join("index");
        let store = IndexStore::open(index_dir.join("index.json")).await.unwrap();

        let v1 = HostSyncState::new("nas").advance(
            Fingerprint::of_paths(["/m/a.mkv"]),
            PathSet::from(["/m/a.mkv".to_string()]),
        );
        store.set_host_state("nas", v1.clone()).await.unwrap();

        // Replace the index directory with a regular file so the next write fails
        std::fs::remove_dir_all(&index_dir).unwrap();
        std::fs::write(&index_dir, b"in the way").unwrap();

        let v2 = v1.clone().advance(
            Fingerprint::of_paths(["/m/a.mkv", "/m/b.mkv"]),
            PathSet::from(["/m/a.mkv".to_string(), "/m/b.mkv".to_string()]),
        );
        let error = store.set_host_state("nas", v2).await.unwrap_err();
        assert_eq!(error.kind(), mediasync_types::ErrorKind::Io);
        assert_eq!(store.get_host_state("nas").await.unwrap(), Some(v1));

        let error = store
            .set_host_state("pi", HostSyncState::new("pi"))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), mediasync_types::ErrorKind::Io);
        assert!(store.get_host_state("pi").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_host_entry_paths() {
        let store = IndexStore::in_memory();
        store.add_entry("nas", &record("/m/a.mkv")).await.unwrap();
        store.add_entry("nas", &record("/m/b.mkv")).await.unwrap();
        store.add_entry("pi", &record("/m/c.mkv")).await.unwrap();

        assert_eq!(
            store.host_entry_paths("nas").await.unwrap(),
            PathSet::from(["/m/a.mkv".to_string(), "/m/b.mkv".to_string()])
        );
        assert!(store.host_entry_paths("tv").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let error = IndexStore::open(&path).await.unwrap_err();
        assert_eq!(error.kind(), mediasync_types::ErrorKind::Serialization);
    }
}
