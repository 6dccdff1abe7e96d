//! Core type system and error handling for mediasync
//!
//! This crate provides the foundational types shared by the reconciler, the
//! listing service and the command line tool:
//!
//! - **Data model**: [`FileRecord`], [`HostSyncState`] and [`HostEndpoint`]
//! - **Fingerprints**: the deterministic, order-independent digest of a host's path set
//! - **Error handling**: one error type with kinds and severity levels
//! - **Traits**: the narrow seams between the reconciler and its collaborators
//!
//! # Examples
//!
//! ```rust
//! use mediasync_types::Fingerprint;
//!
//! let a = Fingerprint::of_paths(["/media/b.mkv", "/media/a.mkv"]);
//! let b = Fingerprint::of_paths(["/media/a.mkv", "/media/b.mkv"]);
//! assert_eq!(a, b);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod result;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{ConcurrencyLimit, TimeoutConfig};
pub use error::{Error, ErrorKind, ErrorSeverity};
pub use fingerprint::Fingerprint;
pub use result::Result;
pub use traits::{HostClient, IndexAdapter};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_state_roundtrip_through_json() {
        let state = HostSyncState::new("nas")
            .advance(Fingerprint::of_paths(["a", "b"]), ["a", "b"].map(String::from).into());

        let json = serde_json::to_string(&state).unwrap();
        let parsed: HostSyncState = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.host_name, "nas");
        assert_eq!(parsed.last_fingerprint, state.last_fingerprint);
        assert_eq!(parsed.last_path_set, state.last_path_set);
    }

    #[test]
    fn test_error_severity() {
        let net = Error::network("connection refused");
        assert_eq!(net.severity(), ErrorSeverity::Medium);
        assert!(net.is_transient());

        let config_error = Error::config("empty host registry");
        assert_eq!(config_error.severity(), ErrorSeverity::Critical);
        assert!(!config_error.is_transient());
    }

    #[test]
    fn test_concurrency_limit_validation() {
        assert!(ConcurrencyLimit::new(1).is_ok());
        assert!(ConcurrencyLimit::new(0).is_err());
        assert!(ConcurrencyLimit::new(10_000).is_err());
    }
}
