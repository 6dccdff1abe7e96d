//! Configuration builder for flexible configuration loading

use crate::{Config, ConfigError, ConfigResult};
use config::{ConfigBuilder as ConfigBuilderInner, Environment, File, FileFormat};
use std::path::{Path, PathBuf};

/// Configuration builder for loading configuration from multiple sources
///
/// Sources are layered in the order they are added, on top of the built-in
/// defaults. Missing files are skipped silently.
#[derive(Debug)]
pub struct ConfigBuilder {
    inner: ConfigBuilderInner<config::builder::DefaultState>,
    sources: Vec<ConfigSource>,
    env_separator: String,
}

#[derive(Debug, Clone)]
enum ConfigSource {
    File { path: PathBuf, format: FileFormat },
    Defaults,
    Environment { prefix: String },
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            inner: config::Config::builder(),
            sources: Vec::new(),
            env_separator: "__".to_string(),
        }
    }

    /// Add default configuration values
    pub fn add_defaults(mut self) -> Self {
        self.sources.push(ConfigSource::Defaults);
        self
    }

    /// Add a configuration file source, format chosen by extension
    pub fn add_source_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let format = Self::detect_format(&path);
        self.sources.push(ConfigSource::File { path, format });
        self
    }

    /// Add environment variable source with prefix, e.g. `MEDIASYNC__LISTER__PORT`
    pub fn add_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.sources.push(ConfigSource::Environment {
            prefix: prefix.into(),
        });
        self
    }

    /// Set environment variable separator (default: "__")
    pub fn env_separator<S: Into<String>>(mut self, separator: S) -> Self {
        self.env_separator = separator.into();
        self
    }

    /// Build the configuration
    pub fn build(mut self) -> ConfigResult<Config> {
        let defaults = Config::default();
        let defaults_value = serde_yaml::to_value(&defaults)
            .map_err(|e| ConfigError::other(format!("Failed to serialize defaults: {e}")))?;
        self.inner = self
            .inner
            .add_source(config::Config::try_from(&defaults_value)?);

        for source in &self.sources {
            match source {
                ConfigSource::File { path, format } => {
                    if path.exists() {
                        self.inner = self
                            .inner
                            .add_source(File::from(path.clone()).format(*format));
                    }
                }
                ConfigSource::Environment { prefix } => {
                    self.inner = self.inner.add_source(
                        Environment::with_prefix(prefix).separator(&self.env_separator),
                    );
                }
                ConfigSource::Defaults => {}
            }
        }

        let config = self.inner.build()?;
        let result: Config = config.try_deserialize()?;

        Self::validate(&result)?;

        Ok(result)
    }

    fn detect_format(path: &Path) -> FileFormat {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Yaml,
        }
    }

    /// Checks that hold for every command. Registry and lister checks are
    /// left to the commands that need them.
    fn validate(config: &Config) -> ConfigResult<()> {
        let timeouts = &config.reconciler.timeouts;
        if timeouts.health_secs == 0 || timeouts.list_secs == 0 || timeouts.host_secs == 0 {
            return Err(ConfigError::validation("Timeouts must be greater than 0"));
        }

        if config.index.path.as_os_str().is_empty() {
            return Err(ConfigError::missing_required("index.path"));
        }

        if !["trace", "debug", "info", "warn", "error"].contains(&config.logging.level.as_str()) {
            return Err(ConfigError::validation(
                "Log level must be one of: trace, debug, info, warn, error",
            ));
        }

        Ok(())
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn temp_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn test_builder_defaults() {
        let config = ConfigBuilder::new().add_defaults().build().unwrap();
        assert_eq!(config.reconciler.max_concurrent_hosts.get(), 8);
        assert_eq!(config.reconciler.timeouts.health_secs, 5);
        assert_eq!(config.lister.bind_address, "0.0.0.0");
        assert!(config.lister.friendly_name.is_none());
    }

    #[test]
    fn test_builder_yaml_file() {
        let file = temp_config(
            ".yaml",
            r#"
hosts:
  - name: nas
    url: http://nas:8080
reconciler:
  max_concurrent_hosts: 2
lister:
  dirs: [/srv/movies, /srv/shows]
  friendly_name: living-room
"#,
        );

        let config = ConfigBuilder::new()
            .add_defaults()
            .add_source_file(file.path())
            .build()
            .unwrap();

        assert_eq!(config.hosts.len(), 1);
        assert_eq!(config.reconciler.max_concurrent_hosts.get(), 2);
        assert_eq!(config.reconciler.timeouts.list_secs, 30);
        assert_eq!(config.lister.dirs.len(), 2);
        assert_eq!(config.lister.friendly_name.as_deref(), Some("living-room"));
    }

    #[test]
    fn test_builder_reads_host_registry_json() {
        let file = temp_config(
            ".json",
            r#"{"hosts": [{"name": "nas", "url": "http://nas:8080"}, {"name": "pi", "url": "http://pi:8080"}]}"#,
        );

        let config = ConfigBuilder::new()
            .add_defaults()
            .add_source_file(file.path())
            .build()
            .unwrap();

        assert_eq!(config.hosts[1].name, "pi");
        assert!(config.validate_registry().is_ok());
    }

    #[test]
    fn test_builder_env_override() {
        std::env::set_var("MEDIASYNCBUILDERTEST__LISTER__PORT", "9123");

        let config = ConfigBuilder::new()
            .add_defaults()
            .add_env_prefix("MEDIASYNCBUILDERTEST")
            .build()
            .unwrap();

        std::env::remove_var("MEDIASYNCBUILDERTEST__LISTER__PORT");
        assert_eq!(config.lister.port, 9123);
    }

    #[test]
    fn test_builder_validation() {
        let file = temp_config(
            ".yaml",
            r#"
reconciler:
  timeouts:
    host_secs: 0
"#,
        );

        let result = ConfigBuilder::new()
            .add_defaults()
            .add_source_file(file.path())
            .build();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Timeouts must be greater than 0"));
    }

    #[test]
    fn test_builder_rejects_zero_concurrency() {
        let file = temp_config(".toml", "[reconciler]\nmax_concurrent_hosts = 0\n");

        let result = ConfigBuilder::new()
            .add_defaults()
            .add_source_file(file.path())
            .build();

        assert!(result.is_err());
    }
}
