//! Configuration value types for mediasync
//!
//! Validated newtypes shared by the configuration crate and the runtime
//! components that consume it.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on hosts reconciled at the same time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct ConcurrencyLimit(usize);

impl ConcurrencyLimit {
    /// Minimum concurrency
    pub const MIN: usize = 1;
    /// Maximum concurrency
    pub const MAX: usize = 1024;
    /// Default concurrency
    pub const DEFAULT: usize = 8;

    /// Create a new concurrency limit with validation
    pub fn new(limit: usize) -> Result<Self, String> {
        if limit < Self::MIN {
            Err(format!("Concurrency limit {} is below minimum {}", limit, Self::MIN))
        } else if limit > Self::MAX {
            Err(format!("Concurrency limit {} exceeds maximum {}", limit, Self::MAX))
        } else {
            Ok(Self(limit))
        }
    }

    /// Get the limit value
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for ConcurrencyLimit {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<usize> for ConcurrencyLimit {
    type Error = String;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ConcurrencyLimit> for usize {
    fn from(limit: ConcurrencyLimit) -> Self {
        limit.0
    }
}

/// Timeouts applied while talking to listing hosts, in whole seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Timeout for a single `/health` request
    pub health_secs: u64,
    /// Timeout for a single `/list` request
    pub list_secs: u64,
    /// Budget for a host's whole network phase within one cycle
    pub host_secs: u64,
}

impl TimeoutConfig {
    /// Timeout for the fingerprint fetch
    pub fn health(&self) -> Duration {
        Duration::from_secs(self.health_secs)
    }

    /// Timeout for the listing fetch
    pub fn list(&self) -> Duration {
        Duration::from_secs(self.list_secs)
    }

    /// Per-host budget for one cycle
    pub fn host(&self) -> Duration {
        Duration::from_secs(self.host_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            health_secs: 5,
            list_secs: 30,
            host_secs: 45,
        }
    }
}
