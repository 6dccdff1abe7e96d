//! Wire protocol between listing hosts and the reconciler
//!
//! All endpoints are plain `GET` requests answered with JSON.

use mediasync_types::{FileRecord, Fingerprint};
use serde::{Deserialize, Deserializer, Serialize};

/// Path of the health endpoint
pub const HEALTH_PATH: &str = "/health";
/// Path of the full listing endpoint
pub const LIST_PATH: &str = "/list";
/// Path of the wildcard filter endpoint
pub const FILTER_PATH: &str = "/filter";

/// Status value of a healthy host
pub const STATUS_OK: &str = "ok";

/// Body of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` for a healthy host
    pub status: String,
    /// Friendly name of the host
    pub host: String,
    /// Fingerprint of the host's current path set
    pub version: Fingerprint,
}

impl HealthResponse {
    /// Healthy response for `host` at `version`
    pub fn ok(host: impl Into<String>, version: Fingerprint) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            host: host.into(),
            version,
        }
    }

    /// Whether the host reports itself healthy
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// Body of `GET /list` and `GET /filter`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponse {
    /// Friendly name of the host
    pub host: String,
    /// Files, in no particular order
    #[serde(default, deserialize_with = "null_as_empty")]
    pub files: Vec<FileRecord>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<FileRecord>, D::Error> {
    Ok(Option::<Vec<FileRecord>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Query string of `GET /filter`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterQuery {
    /// Wildcard pattern
    pub q: Option<String>,
}
