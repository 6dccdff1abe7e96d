//! Configuration management system for mediasync
//!
//! Configuration is loaded once at startup from layered sources (defaults,
//! then a YAML/TOML/JSON file, then `MEDIASYNC__*` environment variables),
//! validated, and handed to the reconciler and the listing service as plain
//! values. Nothing reads configuration from a global after startup.
//!
//! # Examples
//!
//! ```rust
//! use mediasync_config::ConfigBuilder;
//!
//! let config = ConfigBuilder::new()
//!     .add_defaults()
//!     .add_env_prefix("MEDIASYNC")
//!     .build()
//!     .expect("Failed to load configuration");
//!
//! assert_eq!(config.lister.port, 8080);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use mediasync_types::{ConcurrencyLimit, HostEndpoint, TimeoutConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

/// Main configuration structure for mediasync
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Registry of listing hosts to reconcile
    pub hosts: Vec<HostConfig>,
    /// Reconciler tuning
    pub reconciler: ReconcilerConfig,
    /// Local index location
    pub index: IndexConfig,
    /// Listing service settings (used by `serve`)
    pub lister: ListerSettings,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// One entry of the host registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Registry name of the host
    pub name: String,
    /// Base URL of its listing service
    pub url: String,
}

impl From<&HostConfig> for HostEndpoint {
    fn from(host: &HostConfig) -> Self {
        HostEndpoint::new(host.name.clone(), host.url.clone())
    }
}

/// Reconciler configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    /// Maximum number of hosts reconciled concurrently
    pub max_concurrent_hosts: ConcurrencyLimit,
    /// Network timeouts
    pub timeouts: TimeoutConfig,
}

/// Local index configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Path of the persisted index document
    pub path: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".media-index").join("index.json"),
        }
    }
}

/// Listing service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListerSettings {
    /// Address to bind
    pub bind_address: String,
    /// Port to listen on
    pub port: u16,
    /// Directories to scan
    pub dirs: Vec<PathBuf>,
    /// Name reported to clients; defaults to the OS hostname
    pub friendly_name: Option<String>,
}

impl Default for ListerSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            dirs: Vec::new(),
            friendly_name: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Enable JSON formatting
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Config {
    /// The host registry as endpoints
    pub fn registry(&self) -> Vec<HostEndpoint> {
        self.hosts.iter().map(HostEndpoint::from).collect()
    }

    /// Validate the host registry before a reconciliation run
    pub fn validate_registry(&self) -> ConfigResult<()> {
        if self.hosts.is_empty() {
            return Err(ConfigError::missing_required("hosts"));
        }

        let mut seen = HashSet::new();
        for host in &self.hosts {
            if host.name.trim().is_empty() {
                return Err(ConfigError::validation("Host names must not be empty"));
            }
            if !seen.insert(host.name.as_str()) {
                return Err(ConfigError::validation(format!(
                    "Duplicate host name '{}'",
                    host.name
                )));
            }

            let parsed = url::Url::parse(&host.url).map_err(|e| {
                ConfigError::invalid_value(format!("hosts.{}.url", host.name), e.to_string())
            })?;
            if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
                return Err(ConfigError::invalid_value(
                    format!("hosts.{}.url", host.name),
                    format!("'{}' is not an http(s) URL with a host", host.url),
                ));
            }
        }

        Ok(())
    }

    /// Validate the listing service settings before serving
    pub fn validate_lister(&self) -> ConfigResult<()> {
        if self.lister.dirs.is_empty() {
            return Err(ConfigError::validation(
                "At least one directory must be configured for the listing service",
            ));
        }
        self.lister_addr().map(|_| ())
    }

    /// Socket address the listing service binds to
    pub fn lister_addr(&self) -> ConfigResult<SocketAddr> {
        format!("{}:{}", self.lister.bind_address, self.lister.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| {
                ConfigError::invalid_value("lister.bind_address".to_string(), e.to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn with_hosts(hosts: &[(&str, &str)]) -> Config {
        Config {
            hosts: hosts
                .iter()
                .map(|(name, url)| HostConfig {
                    name: (*name).to_string(),
                    url: (*url).to_string(),
                })
                .collect(),
            ..Config::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.hosts.is_empty());
        assert_eq!(config.reconciler.max_concurrent_hosts.get(), 8);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_registry_is_rejected() {
        let err = Config::default().validate_registry().unwrap_err();
        assert!(err.to_string().contains("hosts"));
    }

    #[rstest]
    #[case("not a url")]
    #[case("ftp://nas:21")]
    #[case("file:///srv/media")]
    fn test_invalid_host_url_is_rejected(#[case] url: &str) {
        let config = with_hosts(&[("nas", url)]);
        assert!(config.validate_registry().is_err());
    }

    #[test]
    fn test_duplicate_host_names_are_rejected() {
        let config = with_hosts(&[("nas", "http://a:8080"), ("nas", "http://b:8080")]);
        let err = config.validate_registry().unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn test_valid_registry() {
        let config = with_hosts(&[("nas", "http://nas:8080"), ("box", "https://box.lan")]);
        assert!(config.validate_registry().is_ok());
        assert_eq!(config.registry()[1], HostEndpoint::new("box", "https://box.lan"));
    }

    #[test]
    fn test_lister_requires_dirs() {
        let mut config = Config::default();
        assert!(config.validate_lister().is_err());

        config.lister.dirs.push(PathBuf::from("/srv/media"));
        assert!(config.validate_lister().is_ok());
        assert_eq!(config.lister_addr().unwrap().port(), 8080);
    }
}
