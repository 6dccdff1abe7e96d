//! mediasync end-to-end testing suite
//!
//! Helpers for running real listing services over temporary media
//! directories and reconciling them into a local index.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Unified test utilities
///
/// Shared by the integration tests so every scenario builds listers and
/// reconcilers the same way.
pub mod test_utils;
