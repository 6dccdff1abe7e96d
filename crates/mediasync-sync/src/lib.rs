//! Fleet reconciliation for mediasync
//!
//! This crate keeps the local media index in step with a fleet of listing
//! hosts:
//!
//! - **Diff Engine**: path set differences between two snapshots of a host
//! - **Index Store**: the persisted JSON index and per-host sync state
//! - **Reconciler**: concurrent, failure-isolated poll cycles over all hosts
//! - **Reports**: per-host outcomes and cycle tallies
//!
//! # Examples
//!
//! ```rust,no_run
//! use mediasync_sync::{IndexStore, Reconciler, ReconcilerOptions};
//! use mediasync_types::{HostClient, HostEndpoint};
//! use std::sync::Arc;
//!
//! # async fn example(client: Arc<dyn HostClient>) -> mediasync_types::Result<()> {
//! let index = Arc::new(IndexStore::open(".media-index/index.json").await?);
//! let hosts = vec![HostEndpoint::new("nas", "http://nas:8080")];
//! let reconciler = Reconciler::new(client, index.clone(), hosts, ReconcilerOptions::default());
//!
//! let report = reconciler.run_cycle(false).await;
//! println!("{} synced, {} failed", report.synced_count(), report.failed_count());
//! index.save().await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod diff;
pub mod engine;
pub mod index;
pub mod report;

pub use diff::{diff, plan, PathDiff, SyncPlan};
pub use engine::{Reconciler, ReconcilerOptions};
pub use index::{IndexEntry, IndexStore, SearchHit};
pub use report::{CycleReport, HostOutcome, HostStatus};
