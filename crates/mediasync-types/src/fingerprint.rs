//! Host fingerprints
//!
//! A fingerprint is a pure function of the *set* of paths a host serves.
//! Paths are deduplicated, sorted byte-wise, length-prefixed and hashed with
//! SHA-256, so walk order, listing order and history never leak into it.
//! Sizes and timestamps are deliberately not part of the input.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Opaque digest summarizing a host's current path set
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Prefix naming the digest algorithm
    pub const PREFIX: &'static str = "sha256:";

    /// Compute the fingerprint of a collection of paths
    pub fn of_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut canonical: Vec<S> = paths.into_iter().collect();
        canonical.sort_unstable_by(|a, b| a.as_ref().as_bytes().cmp(b.as_ref().as_bytes()));
        canonical.dedup_by(|a, b| a.as_ref() == b.as_ref());

        let mut hasher = Sha256::new();
        for path in &canonical {
            let bytes = path.as_ref().as_bytes();
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        }

        Self(format!("{}{:x}", Self::PREFIX, hasher.finalize()))
    }

    /// Wrap a fingerprint received from a host
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The fingerprint as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for log lines and terminal output
    pub fn short(&self) -> &str {
        let end = (Self::PREFIX.len() + 12).min(self.0.len());
        self.0.get(..end).unwrap_or(&self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Fingerprint {
    fn from(value: String) -> Self {
        Self(value)
    }
}
