//! Reconciliation engine
//!
//! One cycle fans out to one task per registered host. Each task checks the
//! host's fingerprint, fetches the full listing only when it changed, applies
//! the diff to the index and then records the new sync state. Hosts never
//! wait on each other and a failing host only affects its own outcome.

use crate::diff;
use crate::report::{CycleReport, HostOutcome};
use chrono::Utc;
use futures::future::join_all;
use mediasync_config::ReconcilerConfig;
use mediasync_types::{
    Error, FileRecord, Fingerprint, HostClient, HostEndpoint, HostSyncState, IndexAdapter, Result,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, info_span, warn, Instrument};

/// Runtime options of the reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerOptions {
    /// Maximum number of hosts processed at the same time
    pub max_concurrent_hosts: usize,
    /// Budget for the network phase of one host
    pub host_timeout: Duration,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self::from(&ReconcilerConfig::default())
    }
}

impl From<&ReconcilerConfig> for ReconcilerOptions {
    fn from(config: &ReconcilerConfig) -> Self {
        Self {
            max_concurrent_hosts: config.max_concurrent_hosts.get(),
            host_timeout: config.timeouts.host(),
        }
    }
}

/// Per-host mutual exclusion so overlapping cycles never reconcile the same
/// host at once
#[derive(Debug, Default)]
struct HostLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl HostLocks {
    fn get(&self, host: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(host.to_string()).or_default())
    }
}

enum Fetched {
    Unchanged,
    Changed {
        fingerprint: Fingerprint,
        listing: Vec<FileRecord>,
    },
}

/// Keeps the index in step with the registered hosts
pub struct Reconciler {
    client: Arc<dyn HostClient>,
    index: Arc<dyn IndexAdapter>,
    hosts: Vec<HostEndpoint>,
    options: ReconcilerOptions,
    semaphore: Arc<Semaphore>,
    host_locks: Arc<HostLocks>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("hosts", &self.hosts)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Create a reconciler for `hosts`
    pub fn new(
        client: Arc<dyn HostClient>,
        index: Arc<dyn IndexAdapter>,
        hosts: Vec<HostEndpoint>,
        options: ReconcilerOptions,
    ) -> Self {
        let permits = options.max_concurrent_hosts.max(1);
        Self {
            client,
            index,
            hosts,
            semaphore: Arc::new(Semaphore::new(permits)),
            host_locks: Arc::new(HostLocks::default()),
            options,
        }
    }

    /// Registered hosts, in registry order
    pub fn hosts(&self) -> &[HostEndpoint] {
        &self.hosts
    }

    /// Run one reconciliation cycle over every registered host
    ///
    /// With `force` set the fingerprint fast path is bypassed and every host
    /// is re-listed and diffed against the entries actually in the index, so
    /// entries stranded by an earlier partial failure are cleaned up.
    pub async fn run_cycle(&self, force: bool) -> CycleReport {
        let cycle_id = uuid::Uuid::new_v4();
        let span = info_span!("cycle", id = %cycle_id);

        async move {
            let started_at = Utc::now();
            let start = Instant::now();
            info!("Reconciling {} hosts (force: {})", self.hosts.len(), force);

            let tasks: Vec<_> = self
                .hosts
                .iter()
                .map(|host| {
                    let name = host.name.clone();
                    let handle = tokio::spawn(
                        self.host_task(host.clone(), force)
                            .instrument(info_span!("host", name = %host.name)),
                    );
                    (name, handle)
                })
                .collect();

            let (names, handles): (Vec<_>, Vec<_>) = tasks.into_iter().unzip();
            let outcomes: Vec<HostOutcome> = join_all(handles)
                .await
                .into_iter()
                .zip(names)
                .map(|(joined, name)| {
                    joined.unwrap_or_else(|e| {
                        warn!("Task for host {} did not complete: {}", name, e);
                        HostOutcome::failed(name, Error::other(format!("host task aborted: {e}")))
                    })
                })
                .collect();

            let report = CycleReport {
                cycle_id,
                started_at,
                duration: start.elapsed(),
                outcomes,
            };

            info!(
                "Cycle finished in {:?}: {} skipped, {} synced (+{} -{}), {} failed",
                report.duration,
                report.skipped_count(),
                report.synced_count(),
                report.total_added(),
                report.total_removed(),
                report.failed_count()
            );
            report
        }
        .instrument(span)
        .await
    }

    /// Run cycles every `interval` until `shutdown` resolves
    ///
    /// `force` applies to the first cycle only. Returns the number of cycles
    /// run.
    pub async fn watch<S, F>(
        &self,
        interval: Duration,
        force: bool,
        shutdown: S,
        mut on_report: F,
    ) -> usize
    where
        S: Future<Output = ()>,
        F: FnMut(&CycleReport),
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut cycles = 0;
        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                _ = ticker.tick() => {
                    let report = self.run_cycle(force && cycles == 0).await;
                    cycles += 1;
                    on_report(&report);
                }
            }
        }

        info!("Watch stopped after {} cycles", cycles);
        cycles
    }

    fn host_task(&self, host: HostEndpoint, force: bool) -> impl Future<Output = HostOutcome> {
        let client = Arc::clone(&self.client);
        let index = Arc::clone(&self.index);
        let semaphore = Arc::clone(&self.semaphore);
        let lock = self.host_locks.get(&host.name);
        let host_timeout = self.options.host_timeout;

        async move {
            let _guard = lock.lock_owned().await;
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => return HostOutcome::failed(&host.name, Error::other(e.to_string())),
            };

            match reconcile_host(client.as_ref(), index.as_ref(), &host, force, host_timeout).await {
                Ok(outcome) => outcome,
                Err(error) => {
                    warn!("Host {} failed: {}", host.name, error);
                    HostOutcome::failed(&host.name, error)
                }
            }
        }
    }
}

async fn reconcile_host(
    client: &dyn HostClient,
    index: &dyn IndexAdapter,
    host: &HostEndpoint,
    force: bool,
    host_timeout: Duration,
) -> Result<HostOutcome> {
    let prior = index
        .get_host_state(&host.name)
        .await?
        .unwrap_or_else(|| HostSyncState::new(&host.name));

    let fetched = tokio::time::timeout(host_timeout, fetch(client, host, &prior, force))
        .await
        .map_err(|_| Error::timeout(host_timeout))??;

    let (fingerprint, listing) = match fetched {
        Fetched::Unchanged => {
            debug!("Fingerprint unchanged, skipping");
            return Ok(HostOutcome::skipped(&host.name));
        }
        Fetched::Changed {
            fingerprint,
            listing,
        } => (fingerprint, listing),
    };

    // Forced cycles repair drift left by earlier partial failures
    let plan = if force {
        let indexed = index.host_entry_paths(&host.name).await?;
        diff::plan(&indexed, listing)
    } else {
        diff::plan(&prior.last_path_set, listing)
    };

    for path in &plan.removed {
        index
            .remove_entry(&host.name, path)
            .await
            .map_err(|e| Error::index_mutation(format!("removing '{path}': {e}")))?;
    }
    for record in &plan.added {
        index
            .add_entry(&host.name, record)
            .await
            .map_err(|e| Error::index_mutation(format!("adding '{}': {e}", record.path)))?;
    }

    index
        .set_host_state(&host.name, prior.advance(fingerprint.clone(), plan.path_set))
        .await?;

    info!(
        "Synced to {}: +{} -{}",
        fingerprint.short(),
        plan.added.len(),
        plan.removed.len()
    );
    Ok(HostOutcome::synced(&host.name, plan.added, plan.removed))
}

async fn fetch(
    client: &dyn HostClient,
    host: &HostEndpoint,
    prior: &HostSyncState,
    force: bool,
) -> Result<Fetched> {
    let fingerprint = client.fetch_fingerprint(host).await?;
    if !force && prior.is_current(&fingerprint) {
        return Ok(Fetched::Unchanged);
    }

    debug!("Fingerprint {} differs from stored state, listing", fingerprint.short());
    let listing = client.fetch_listing(host).await?;
    Ok(Fetched::Changed {
        fingerprint,
        listing,
    })
}
