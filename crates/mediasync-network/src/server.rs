//! Listing service
//!
//! Every request rescans the configured directories on a blocking thread, so
//! responses always reflect the current file set.

use crate::filter::Pattern;
use crate::protocol::{
    FilterQuery, HealthResponse, ListResponse, FILTER_PATH, HEALTH_PATH, LIST_PATH,
};
use crate::scanner;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use mediasync_config::ListerSettings;
use mediasync_types::{Error, FileRecord, Fingerprint, Result};
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Runtime configuration of a listing host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListerConfig {
    /// Directories to scan
    pub dirs: Vec<PathBuf>,
    /// Name reported in every response
    pub friendly_name: String,
}

impl ListerConfig {
    /// Create a lister configuration, defaulting the name to the OS hostname
    pub fn new(dirs: Vec<PathBuf>, friendly_name: Option<String>) -> Self {
        let friendly_name = friendly_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(default_host_name);
        Self { dirs, friendly_name }
    }
}

impl From<&ListerSettings> for ListerConfig {
    fn from(settings: &ListerSettings) -> Self {
        Self::new(settings.dirs.clone(), settings.friendly_name.clone())
    }
}

/// OS hostname, or `"unknown"` if it cannot be determined
pub fn default_host_name() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

enum ServerError {
    MissingQuery,
    Scan(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            Self::MissingQuery => (StatusCode::BAD_REQUEST, "missing 'q' parameter").into_response(),
            Self::Scan(message) => (StatusCode::INTERNAL_SERVER_ERROR, message).into_response(),
        }
    }
}

type Shared = Arc<ListerConfig>;

/// Build the router serving `/health`, `/list` and `/filter`
pub fn router(config: ListerConfig) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(LIST_PATH, get(list))
        .route(FILTER_PATH, get(filter))
        .with_state(Arc::new(config))
}

async fn scan_blocking<T, F>(config: &Shared, scan: F) -> std::result::Result<T, ServerError>
where
    T: Send + 'static,
    F: FnOnce(&[PathBuf]) -> T + Send + 'static,
{
    let config = Arc::clone(config);
    tokio::task::spawn_blocking(move || scan(config.dirs.as_slice()))
        .await
        .map_err(|e| ServerError::Scan(format!("scan failed: {e}")))
}

async fn health(State(config): State<Shared>) -> std::result::Result<Json<HealthResponse>, ServerError> {
    let version: Fingerprint = scan_blocking(&config, |dirs| scanner::fingerprint_dirs(dirs)).await?;
    debug!("Health check, version {}", version.short());
    Ok(Json(HealthResponse::ok(config.friendly_name.clone(), version)))
}

async fn list(State(config): State<Shared>) -> std::result::Result<Json<ListResponse>, ServerError> {
    let files: Vec<FileRecord> = scan_blocking(&config, |dirs| scanner::scan_dirs(dirs)).await?;
    debug!("Listing {} files", files.len());
    Ok(Json(ListResponse {
        host: config.friendly_name.clone(),
        files,
    }))
}

async fn filter(
    State(config): State<Shared>,
    Query(query): Query<FilterQuery>,
) -> std::result::Result<Json<ListResponse>, ServerError> {
    let raw = query.q.filter(|q| !q.is_empty()).ok_or(ServerError::MissingQuery)?;
    let pattern = Pattern::classify(&raw);

    let files = scan_blocking(&config, move |dirs| scanner::scan_matching(dirs, &pattern)).await?;
    debug!("Filter '{}' matched {} files", raw, files.len());
    Ok(Json(ListResponse {
        host: config.friendly_name.clone(),
        files,
    }))
}

/// A bound listing host
#[derive(Debug)]
pub struct ListerServer {
    listener: TcpListener,
    config: ListerConfig,
}

impl ListerServer {
    /// Bind to `addr`; port 0 picks a free port
    pub async fn bind(addr: SocketAddr, config: ListerConfig) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::network(format!("Failed to bind {addr}: {e}")))?;
        Ok(Self { listener, config })
    }

    /// Address actually bound
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve requests until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        info!(
            "Starting listing service on {} (host: {})",
            addr, self.config.friendly_name
        );
        info!("Scanning directories: {:?}", self.config.dirs);

        axum::serve(self.listener, router(self.config))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| Error::network(format!("Listing service failed: {e}")))?;

        info!("Listing service on {} stopped", addr);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;
    use tokio::sync::oneshot;

    struct Running {
        base: String,
        stop: Option<oneshot::Sender<()>>,
        _dir: TempDir,
    }

    impl Drop for Running {
        fn drop(&mut self) {
            if let Some(stop) = self.stop.take() {
                let _ = stop.send(());
            }
        }
    }

    async fn start(files: &[&str]) -> Running {
        let dir = TempDir::new().unwrap();
        for file in files {
            fs::write(dir.path().join(file), b"test").unwrap();
        }

        let config = ListerConfig::new(vec![dir.path().to_path_buf()], Some("test-host".into()));
        let server = ListerServer::bind("127.0.0.1:0".parse().unwrap(), config)
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel();
        tokio::spawn(server.run(async move {
            let _ = stopped.await;
        }));

        Running {
            base: format!("http://{addr}"),
            stop: Some(stop),
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn test_health() {
        let server = start(&["test.mkv"]).await;
        let health: HealthResponse = reqwest::get(format!("{}/health", server.base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert!(health.is_ok());
        assert_eq!(health.host, "test-host");
        assert!(health.version.as_str().starts_with("sha256:"));
    }

    #[tokio::test]
    async fn test_list_and_health_agree() {
        let server = start(&["a.mkv", "b.mkv"]).await;
        let listing: ListResponse = reqwest::get(format!("{}/list", server.base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let health: HealthResponse = reqwest::get(format!("{}/health", server.base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(listing.files.len(), 2);
        assert_eq!(
            health.version,
            Fingerprint::of_paths(listing.files.iter().map(|f| f.path.as_str()))
        );
    }

    #[rstest]
    #[case("*edge*", 1)]
    #[case("*darkness*", 1)]
    #[case("*.mkv", 2)]
    #[case("*1080*", 1)]
    #[case("*notfound*", 0)]
    #[tokio::test]
    async fn test_filter(#[case] query: &str, #[case] expected: usize) {
        let server = start(&["Edge.of.Darkness.2010.1080p.mkv", "Other.Movie.720p.mkv"]).await;
        let response = reqwest::Client::new()
            .get(format!("{}/filter", server.base))
            .query(&[("q", query)])
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let listing: ListResponse = response.json().await.unwrap();
        assert_eq!(listing.files.len(), expected);
    }

    #[rstest]
    #[case("/filter")]
    #[case("/filter?q=")]
    #[tokio::test]
    async fn test_filter_requires_query(#[case] path: &str) {
        let server = start(&["a.mkv"]).await;
        let response = reqwest::get(format!("{}{}", server.base, path)).await.unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(response.text().await.unwrap(), "missing 'q' parameter");
    }

    #[test]
    fn test_friendly_name_defaults_to_hostname() {
        let config = ListerConfig::new(Vec::new(), None);
        assert!(!config.friendly_name.is_empty());
        assert_eq!(ListerConfig::new(Vec::new(), Some(String::new())).friendly_name, config.friendly_name);
    }
}
