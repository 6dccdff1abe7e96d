//! Unified test utilities for mediasync integration tests

use mediasync_network::{ClientConfig, HttpHostClient, ListerConfig, ListerServer};
use mediasync_sync::{IndexStore, Reconciler, ReconcilerOptions};
use mediasync_types::{HostEndpoint, IndexAdapter};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// A temporary directory of fake media files
pub struct MediaDir {
    dir: TempDir,
}

impl MediaDir {
    /// Create an empty media directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create media directory"),
        }
    }

    /// Create a media directory holding `names`
    pub fn with_files(names: &[&str]) -> Self {
        let media = Self::new();
        for name in names {
            media.add(name);
        }
        media
    }

    /// Root of the directory
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of `name` as a listing reports it
    pub fn file_path(&self, name: &str) -> String {
        self.dir.path().join(name).to_string_lossy().into_owned()
    }

    /// Write `name`, creating parent directories as needed
    pub fn add(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, name.as_bytes()).expect("Failed to write media file");
        path
    }

    /// Delete `name`
    pub fn remove(&self, name: &str) {
        fs::remove_file(self.dir.path().join(name)).expect("Failed to remove media file");
    }
}

impl Default for MediaDir {
    fn default() -> Self {
        Self::new()
    }
}

/// A listing service running on a loopback port
///
/// The service stops when this handle is dropped.
pub struct RunningLister {
    /// Endpoint to register with a reconciler
    pub endpoint: HostEndpoint,
    stop: Option<oneshot::Sender<()>>,
}

impl Drop for RunningLister {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

/// Start a listing service named `name` over `dirs`
pub async fn spawn_lister(name: &str, dirs: &[&Path]) -> RunningLister {
    let config = ListerConfig::new(
        dirs.iter().map(|dir| dir.to_path_buf()).collect(),
        Some(name.to_string()),
    );
    let server = ListerServer::bind("127.0.0.1:0".parse().expect("valid address"), config)
        .await
        .expect("Failed to bind listing service");
    let addr = server.local_addr().expect("Failed to read bound address");

    let (stop, stopped) = oneshot::channel::<()>();
    tokio::spawn(server.run(async move {
        let _ = stopped.await;
    }));

    RunningLister {
        endpoint: HostEndpoint::new(name, format!("http://{addr}")),
        stop: Some(stop),
    }
}

/// An endpoint on a loopback port nothing listens on
pub async fn unreachable_endpoint(name: &str) -> HostEndpoint {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind placeholder listener");
    let addr = listener.local_addr().expect("Failed to read placeholder address");
    drop(listener);
    HostEndpoint::new(name, format!("http://{addr}"))
}

/// Client with short timeouts suited to loopback tests
pub fn test_client() -> HttpHostClient {
    HttpHostClient::new(ClientConfig {
        health_timeout: Duration::from_secs(2),
        list_timeout: Duration::from_secs(2),
    })
    .expect("Failed to build HTTP client")
}

/// Reconciler over `hosts` writing into `index`
pub fn reconciler(hosts: Vec<HostEndpoint>, index: &Arc<IndexStore>, max_concurrent_hosts: usize) -> Reconciler {
    Reconciler::new(
        Arc::new(test_client()),
        Arc::clone(index) as Arc<dyn IndexAdapter>,
        hosts,
        ReconcilerOptions {
            max_concurrent_hosts,
            host_timeout: Duration::from_secs(5),
        },
    )
}
