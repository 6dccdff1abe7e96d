//! HTTP client for listing hosts

use crate::protocol::{HealthResponse, ListResponse, HEALTH_PATH, LIST_PATH};
use async_trait::async_trait;
use mediasync_types::{
    Error, FileRecord, Fingerprint, HostClient, HostEndpoint, Result, TimeoutConfig,
};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Timeout of a `/health` request
    pub health_timeout: Duration,
    /// Timeout of a `/list` request
    pub list_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from(&TimeoutConfig::default())
    }
}

impl From<&TimeoutConfig> for ClientConfig {
    fn from(timeouts: &TimeoutConfig) -> Self {
        Self {
            health_timeout: timeouts.health(),
            list_timeout: timeouts.list(),
        }
    }
}

/// [`HostClient`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpHostClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpHostClient {
    /// Create a client
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("mediasync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        host: &HostEndpoint,
        path: &str,
        timeout: Duration,
    ) -> Result<T> {
        let url = host.endpoint(path);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| request_error(&url, timeout, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(format!("{url} returned {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| request_error(&url, timeout, &e))?;

        serde_json::from_slice(&body)
            .map_err(|e| Error::malformed(format!("{url} returned an unexpected body: {e}")))
    }
}

fn request_error(url: &str, timeout: Duration, error: &reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::timeout(timeout)
    } else {
        Error::network(format!("{url}: {error}"))
    }
}

#[async_trait]
impl HostClient for HttpHostClient {
    async fn fetch_fingerprint(&self, host: &HostEndpoint) -> Result<Fingerprint> {
        let health: HealthResponse = self
            .get_json(host, HEALTH_PATH, self.config.health_timeout)
            .await?;

        if !health.is_ok() {
            return Err(Error::malformed(format!(
                "host {} reported status '{}'",
                host.name, health.status
            )));
        }
        if health.version.as_str().is_empty() {
            return Err(Error::malformed(format!(
                "host {} reported no version",
                host.name
            )));
        }

        Ok(health.version)
    }

    async fn fetch_listing(&self, host: &HostEndpoint) -> Result<Vec<FileRecord>> {
        let listing: ListResponse = self
            .get_json(host, LIST_PATH, self.config.list_timeout)
            .await?;
        debug!("Host {} listed {} files", host.name, listing.files.len());
        Ok(listing.files)
    }
}
