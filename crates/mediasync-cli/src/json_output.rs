//! JSON output structures for the mediasync CLI

use mediasync_sync::{CycleReport, HostOutcome, HostStatus, SearchHit};
use serde::{Deserialize, Serialize};

/// JSON form of a reconciliation cycle
#[derive(Debug, Serialize, Deserialize)]
pub struct CycleReportJson {
    /// Cycle identifier
    pub cycle_id: String,
    /// Start time, RFC 3339
    pub started_at: String,
    /// Wall time in milliseconds
    pub duration_ms: u64,
    /// Tallies across hosts
    pub summary: CycleSummaryJson,
    /// Per-host outcomes, in registry order
    pub hosts: Vec<HostOutcomeJson>,
}

/// Cycle tallies
#[derive(Debug, Serialize, Deserialize)]
pub struct CycleSummaryJson {
    /// Hosts skipped as unchanged
    pub skipped: usize,
    /// Hosts synchronized
    pub synced: usize,
    /// Hosts that failed
    pub failed: usize,
    /// Entries added
    pub added: usize,
    /// Entries removed
    pub removed: usize,
}

/// JSON form of one host's outcome
#[derive(Debug, Serialize, Deserialize)]
pub struct HostOutcomeJson {
    /// Registry name
    pub host: String,
    /// `skipped`, `synced` or `failed`
    pub status: String,
    /// Added paths
    pub added: Vec<String>,
    /// Removed paths
    pub removed: Vec<String>,
    /// Failure reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// JSON form of a search
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResultJson {
    /// Query as given
    pub query: String,
    /// Ranked hits
    pub results: Vec<SearchHitJson>,
}

/// One search hit
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchHitJson {
    /// Entry id, `<host>:<path>`
    pub id: String,
    /// Host serving the file
    pub host: String,
    /// Path on that host
    pub path: String,
    /// File name
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Matched query tokens
    pub score: usize,
}

fn status_label(status: HostStatus) -> &'static str {
    match status {
        HostStatus::Skipped => "skipped",
        HostStatus::Synced => "synced",
        HostStatus::Failed => "failed",
    }
}

impl From<&HostOutcome> for HostOutcomeJson {
    fn from(outcome: &HostOutcome) -> Self {
        Self {
            host: outcome.host_name.clone(),
            status: status_label(outcome.status()).to_string(),
            added: outcome.added.iter().map(|r| r.path.clone()).collect(),
            removed: outcome.removed.clone(),
            error: outcome.error.as_ref().map(ToString::to_string),
        }
    }
}

impl From<&CycleReport> for CycleReportJson {
    fn from(report: &CycleReport) -> Self {
        Self {
            cycle_id: report.cycle_id.to_string(),
            started_at: report.started_at.to_rfc3339(),
            duration_ms: u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
            summary: CycleSummaryJson {
                skipped: report.skipped_count(),
                synced: report.synced_count(),
                failed: report.failed_count(),
                added: report.total_added(),
                removed: report.total_removed(),
            },
            hosts: report.outcomes.iter().map(HostOutcomeJson::from).collect(),
        }
    }
}

impl SearchResultJson {
    /// Build the JSON form of `hits` for `query`
    pub fn new(query: &str, hits: &[SearchHit]) -> Self {
        Self {
            query: query.to_string(),
            results: hits
                .iter()
                .map(|hit| SearchHitJson {
                    id: hit.entry.id.clone(),
                    host: hit.entry.host.clone(),
                    path: hit.entry.path.clone(),
                    name: hit.entry.name.clone(),
                    size: hit.entry.size,
                    score: hit.score,
                })
                .collect(),
        }
    }
}
