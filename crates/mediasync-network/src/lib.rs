//! Listing service and host client for mediasync
//!
//! Both ends of the listing host wire contract live here:
//!
//! - **Listing service**: an `axum` server answering `/health`, `/list` and `/filter`
//! - **Host client**: the `reqwest` based [`HostClient`](mediasync_types::HostClient) used by the reconciler
//! - **Wildcard filter**: DOS-style pattern classification for `/filter`
//!
//! # Examples
//!
//! ```rust,no_run
//! use mediasync_network::{ListerConfig, ListerServer};
//! use std::path::PathBuf;
//!
//! # async fn example() -> mediasync_types::Result<()> {
//! let config = ListerConfig::new(vec![PathBuf::from("/srv/media")], None);
//! let server = ListerServer::bind("0.0.0.0:8080".parse().unwrap(), config).await?;
//! server.run(async {
//!     let _ = tokio::signal::ctrl_c().await;
//! }).await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod filter;
pub mod protocol;
pub mod scanner;
pub mod server;

pub use client::{ClientConfig, HttpHostClient};
pub use filter::Pattern;
pub use protocol::{HealthResponse, ListResponse};
pub use server::{default_host_name, router, ListerConfig, ListerServer};
