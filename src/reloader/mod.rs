// src/reloader/mod.rs

//! The reload coordinator.
//!
//! [`Reloader`] owns the watch registry and the debounced event pipeline,
//! exposes the lifecycle operations (`start` / `stop` / `terminate`), and on
//! each debounced batch asks the remote process to reload its code.
//!
//! Wiring, spawned once at construction:
//!
//! ```text
//! N per-path watches --> fan-in channel --> pump --> debouncer --> driver
//!                                            |                      |
//!                                     change stream          reload stream
//! ```

mod pipeline;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use crate::config::validate::validate_service_url;
use crate::errors::{ReloadError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::remote::{SessionConnector, WsConnector};
use crate::resolve::{self, ManifestPackageResolver, PackageResolver};
use crate::types::ChangeEvent;
use crate::watch::{NotifyWatcher, PathWatcher, WatchRegistry};

use pipeline::{Pipeline, RemoteHandle, StreamHub};

/// Well-known local control endpoint of the remote process.
pub const DEFAULT_SERVICE_URL: &str = "ws://localhost:8181/ws";

/// Default quiescence window between reload triggers.
pub const DEFAULT_DEBOUNCE_INTERVAL: Duration = Duration::from_secs(5);

const FANIN_CAPACITY: usize = 64;
const BATCH_CAPACITY: usize = 16;

/// Lifecycle state of a [`Reloader`]. `Terminated` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloaderState {
    Idle,
    Running,
    Terminated,
}

/// Construction-time configuration for a [`Reloader`].
#[derive(Debug, Clone)]
pub struct ReloaderConfig {
    /// Remote-control endpoint. `None` means the process was launched
    /// without remote-control support and hot reloading is unavailable.
    pub service_url: Option<String>,
    /// Quiescence window between reload triggers.
    pub debounce_interval: Duration,
    /// Package manifest used by the `package:` registration helpers.
    pub package_manifest: Option<PathBuf>,
}

impl Default for ReloaderConfig {
    fn default() -> Self {
        Self {
            service_url: Some(DEFAULT_SERVICE_URL.to_string()),
            debounce_interval: DEFAULT_DEBOUNCE_INTERVAL,
            package_manifest: None,
        }
    }
}

/// Watches registered paths and asks the remote process to reload its code
/// whenever a debounced batch of changes lands.
pub struct Reloader {
    state: ReloaderState,
    registry: WatchRegistry,
    resolver: Arc<dyn PackageResolver>,
    fs: Arc<dyn FileSystem>,
    fanin_tx: mpsc::Sender<ChangeEvent>,
    hub: Arc<StreamHub>,
    remote: Arc<RemoteHandle>,
    pipeline: Pipeline,
}

impl std::fmt::Debug for Reloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reloader")
            .field("state", &self.state)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Reloader {
    /// Create a reloader with the production backends.
    ///
    /// Fails with a configuration error when hot reloading is unavailable
    /// (no remote-control endpoint) or the endpoint URL is invalid. Must be
    /// called within a Tokio runtime; the internal pipeline tasks are
    /// spawned here.
    pub fn new(config: ReloaderConfig) -> Result<Self> {
        Self::with_backends(
            config,
            Arc::new(NotifyWatcher),
            Box::new(WsConnector),
            Arc::new(RealFileSystem),
        )
    }

    /// Create a reloader with explicit watcher/transport/filesystem
    /// backends. Used directly by tests.
    pub fn with_backends(
        config: ReloaderConfig,
        watcher: Arc<dyn PathWatcher>,
        connector: Box<dyn SessionConnector>,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        let Some(url) = config.service_url.clone() else {
            return Err(ReloadError::Config(
                "hot reloading is not available: no remote-control endpoint configured".into(),
            ));
        };
        validate_service_url(&url)?;

        let resolver: Arc<dyn PackageResolver> = Arc::new(ManifestPackageResolver::new(
            Arc::clone(&fs),
            config.package_manifest.clone(),
        ));

        let hub = Arc::new(StreamHub::new());
        let remote = Arc::new(RemoteHandle::new(url, connector));

        // Internal wiring lives for the whole life of the reloader; start()
        // only attaches watches to the fan-in side.
        let (fanin_tx, fanin_rx) = mpsc::channel::<ChangeEvent>(FANIN_CAPACITY);
        let (debounce_tx, debounce_rx) = mpsc::channel::<ChangeEvent>(FANIN_CAPACITY);
        let (batch_tx, batch_rx) = mpsc::channel::<Vec<ChangeEvent>>(BATCH_CAPACITY);

        let pump = tokio::spawn(pipeline::pump_events(
            fanin_rx,
            Arc::clone(&hub),
            debounce_tx,
        ));
        let debouncer =
            crate::debounce::spawn_debouncer(config.debounce_interval, debounce_rx, batch_tx);
        let driver = tokio::spawn(pipeline::drive_reloads(
            batch_rx,
            Arc::clone(&remote),
            Arc::clone(&hub),
        ));

        Ok(Self {
            state: ReloaderState::Idle,
            registry: WatchRegistry::new(Arc::clone(&fs), watcher),
            resolver,
            fs,
            fanin_tx,
            hub,
            remote,
            pipeline: Pipeline::new(vec![pump, debouncer, driver]),
        })
    }

    /// Whether hot reloading is supported in the current run.
    ///
    /// The capability is checked once at construction and a reloader cannot
    /// be built without it, so this is always true for a live instance.
    pub fn is_hot_reloadable(&self) -> bool {
        true
    }

    pub fn state(&self) -> ReloaderState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ReloaderState::Running
    }

    // ---- registration -----------------------------------------------------

    /// Register a single path for watching. Takes effect at the next
    /// `start()`.
    pub fn register_path(&mut self, path: impl Into<String>) -> Result<()> {
        self.ensure_live()?;
        self.registry.register(path);
        Ok(())
    }

    /// Register every entity matching `pattern`, evaluated against the
    /// current working directory. Returns how many matched.
    pub fn register_glob(&mut self, pattern: &str) -> Result<usize> {
        self.ensure_live()?;
        let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let matches = resolve::expand_glob(self.fs.as_ref(), &root, pattern)?;
        let count = matches.len();
        for path in matches {
            self.registry.register(path.to_string_lossy().into_owned());
        }
        Ok(count)
    }

    /// Register the path named by a `file:` URI.
    pub fn register_uri(&mut self, uri: &str) -> Result<()> {
        self.ensure_live()?;
        let path = resolve::file_uri_to_path(uri)?;
        self.registry.register(path.to_string_lossy().into_owned());
        Ok(())
    }

    /// Register the path a `package:` URI resolves to.
    pub fn register_package_uri(&mut self, uri: &str) -> Result<()> {
        self.ensure_live()?;
        let path = self.resolver.resolve_uri(uri)?;
        self.registry.register(path.to_string_lossy().into_owned());
        Ok(())
    }

    /// Register the root directory of every transitive dependency of the
    /// manifest's root package. Returns how many were registered.
    pub fn register_package_dependencies(&mut self) -> Result<usize> {
        self.ensure_live()?;
        let roots = self.resolver.transitive_dependency_roots()?;
        let count = roots.len();
        for root in roots {
            self.registry.register(root.to_string_lossy().into_owned());
        }
        Ok(count)
    }

    pub fn registered_paths(&self) -> Vec<String> {
        self.registry.registered_paths()
    }

    pub fn watched_paths(&self) -> Vec<String> {
        self.registry.watched_paths()
    }

    pub fn is_watching(&self, path: &str) -> bool {
        self.registry.is_watching(path)
    }

    // ---- lifecycle --------------------------------------------------------

    /// Build the watch registry and begin reacting to changes.
    ///
    /// Invoked while already running, this first stops the current watches
    /// and rebuilds from the registered set, so registration changes take
    /// effect immediately. Returns the paths now actively watched.
    pub async fn start(&mut self) -> Result<Vec<String>> {
        self.ensure_live()?;
        if self.state == ReloaderState::Running {
            debug!("start requested while running; restarting watches");
            self.registry.stop_all().await;
        }
        let watched = self.registry.build(&self.fanin_tx);
        self.state = ReloaderState::Running;
        info!(count = watched.len(), "watch registry built");
        Ok(watched)
    }

    /// Stop all watches but keep the reloader restartable. The public event
    /// streams stay open.
    pub async fn stop(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.registry.stop_all().await;
        self.state = ReloaderState::Idle;
        info!("watching stopped");
        Ok(())
    }

    /// Stop everything and close both public event streams. Irreversible:
    /// every subsequent operation fails with the already-terminated error.
    pub async fn terminate(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.registry.stop_all().await;
        self.pipeline.shutdown().await;
        self.hub.close();
        self.state = ReloaderState::Terminated;
        info!("reloader terminated");
        Ok(())
    }

    // ---- reloading --------------------------------------------------------

    /// Ask the remote process to reload now, independent of any batch.
    ///
    /// Connects lazily on first use and reuses the session afterwards. On
    /// success the completion timestamp is also published on the
    /// reload-notification stream.
    pub async fn reload(&mut self) -> Result<SystemTime> {
        self.ensure_live()?;
        pipeline::perform_reload(&self.remote, &self.hub).await
    }

    // ---- observation ------------------------------------------------------

    /// Subscribe to raw (pre-debounce) change notifications.
    pub fn subscribe_changes(&self) -> Result<broadcast::Receiver<ChangeEvent>> {
        self.hub
            .subscribe_changes()
            .ok_or(ReloadError::AlreadyTerminated)
    }

    /// Subscribe to reload-completion timestamps.
    pub fn subscribe_reloads(&self) -> Result<broadcast::Receiver<SystemTime>> {
        self.hub
            .subscribe_reloads()
            .ok_or(ReloadError::AlreadyTerminated)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.state == ReloaderState::Terminated {
            return Err(ReloadError::AlreadyTerminated);
        }
        Ok(())
    }
}
