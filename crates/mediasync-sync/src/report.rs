//! Per-host outcomes and cycle summaries

use chrono::{DateTime, Utc};
use mediasync_types::{Error, FileRecord};
use std::time::Duration;

/// How a host fared in one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStatus {
    /// Fingerprint unchanged, nothing fetched or mutated
    Skipped,
    /// Listing fetched and the diff applied
    Synced,
    /// Fetch or apply failed; stored state left as it was
    Failed,
}

/// Result of reconciling one host in one cycle
#[derive(Debug, Clone)]
pub struct HostOutcome {
    /// Registry name of the host
    pub host_name: String,
    /// Whether the fingerprint fast path applied
    pub skipped: bool,
    /// Records added to the index
    pub added: Vec<FileRecord>,
    /// Paths removed from the index
    pub removed: Vec<String>,
    /// Why the host failed, if it did
    pub error: Option<Error>,
}

impl HostOutcome {
    /// Outcome of an unchanged host
    pub fn skipped(host_name: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
            skipped: true,
            added: Vec::new(),
            removed: Vec::new(),
            error: None,
        }
    }

    /// Outcome of a host whose diff was applied
    pub fn synced(host_name: impl Into<String>, added: Vec<FileRecord>, removed: Vec<String>) -> Self {
        Self {
            host_name: host_name.into(),
            skipped: false,
            added,
            removed,
            error: None,
        }
    }

    /// Outcome of a failed host
    pub fn failed(host_name: impl Into<String>, error: Error) -> Self {
        Self {
            host_name: host_name.into(),
            skipped: false,
            added: Vec::new(),
            removed: Vec::new(),
            error: Some(error),
        }
    }

    /// Classify the outcome
    pub fn status(&self) -> HostStatus {
        if self.error.is_some() {
            HostStatus::Failed
        } else if self.skipped {
            HostStatus::Skipped
        } else {
            HostStatus::Synced
        }
    }
}

/// Summary of one reconciliation cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Identifier of the cycle, also recorded on its log span
    pub cycle_id: uuid::Uuid,
    /// When the cycle started
    pub started_at: DateTime<Utc>,
    /// Wall time of the cycle
    pub duration: Duration,
    /// One outcome per registered host, in registry order
    pub outcomes: Vec<HostOutcome>,
}

impl CycleReport {
    /// Outcomes with the given status
    pub fn with_status(&self, status: HostStatus) -> impl Iterator<Item = &HostOutcome> {
        self.outcomes.iter().filter(move |o| o.status() == status)
    }

    /// Number of hosts skipped as unchanged
    pub fn skipped_count(&self) -> usize {
        self.with_status(HostStatus::Skipped).count()
    }

    /// Number of hosts synchronized
    pub fn synced_count(&self) -> usize {
        self.with_status(HostStatus::Synced).count()
    }

    /// Number of hosts that failed
    pub fn failed_count(&self) -> usize {
        self.with_status(HostStatus::Failed).count()
    }

    /// Entries added across all hosts
    pub fn total_added(&self) -> usize {
        self.outcomes.iter().map(|o| o.added.len()).sum()
    }

    /// Entries removed across all hosts
    pub fn total_removed(&self) -> usize {
        self.outcomes.iter().map(|o| o.removed.len()).sum()
    }

    /// Outcome for a host, by name
    pub fn outcome(&self, host_name: &str) -> Option<&HostOutcome> {
        self.outcomes.iter().find(|o| o.host_name == host_name)
    }
}
