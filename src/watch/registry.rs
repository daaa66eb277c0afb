// src/watch/registry.rs

//! Registered-path bookkeeping and per-path subscription ownership.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::backend::{PathWatcher, WatchSubscription};
use crate::fs::FileSystem;
use crate::types::ChangeEvent;

/// One registered, resolved filesystem location.
///
/// A `WatchedPath` is either active (subscription present, events flow) or
/// inactive (subscription absent); there is no other state.
#[derive(Debug)]
pub struct WatchedPath {
    requested: String,
    resolved: PathBuf,
    subscription: Option<WatchSubscription>,
}

impl WatchedPath {
    pub fn requested(&self) -> &str {
        &self.requested
    }

    pub fn resolved(&self) -> &Path {
        &self.resolved
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }
}

/// Owns the set of registered path requests and the mapping from requested
/// path to its current [`WatchedPath`].
///
/// The active mapping is rebuilt wholesale on every [`WatchRegistry::build`];
/// it is never patched incrementally.
pub struct WatchRegistry {
    fs: Arc<dyn FileSystem>,
    watcher: Arc<dyn PathWatcher>,
    registered: BTreeSet<String>,
    active: HashMap<String, WatchedPath>,
}

impl std::fmt::Debug for WatchRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchRegistry")
            .field("registered", &self.registered)
            .field("active", &self.active.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl WatchRegistry {
    pub fn new(fs: Arc<dyn FileSystem>, watcher: Arc<dyn PathWatcher>) -> Self {
        Self {
            fs,
            watcher,
            registered: BTreeSet::new(),
            active: HashMap::new(),
        }
    }

    /// Add `path` to the registered set. Idempotent; does not itself start
    /// watching anything.
    pub fn register(&mut self, path: impl Into<String>) {
        let path = path.into();
        if self.registered.insert(path.clone()) {
            debug!(path = %path, "path registered");
        }
    }

    /// All registered path requests, in sorted order.
    pub fn registered_paths(&self) -> Vec<String> {
        self.registered.iter().cloned().collect()
    }

    /// Requested paths with a live subscription, in sorted order.
    pub fn watched_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.active.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// True iff `path` is a key in the current active mapping.
    pub fn is_watching(&self, path: &str) -> bool {
        self.active.contains_key(path)
    }

    /// Resolve every registered path and start watching the ones that
    /// resolve, forwarding their events into `sink`.
    ///
    /// Resolution failures (entity missing, filesystem error) skip that one
    /// path and never fail the build. Replaces any prior active mapping
    /// wholesale. Returns the requested paths now actively watched.
    pub fn build(&mut self, sink: &mpsc::Sender<ChangeEvent>) -> Vec<String> {
        self.active.clear();
        let mut watched = Vec::new();

        for requested in &self.registered {
            let resolved = match self.fs.canonicalize(Path::new(requested)) {
                Ok(path) => path,
                Err(err) => {
                    debug!(path = %requested, error = %err, "skipping unresolvable path");
                    continue;
                }
            };

            let subscription = match self.watcher.watch(&resolved, sink.clone()) {
                Ok(subscription) => subscription,
                Err(err) => {
                    warn!(path = %requested, error = %err, "failed to watch path");
                    continue;
                }
            };

            info!(path = %requested, resolved = ?resolved, "now watching path");

            self.active.insert(
                requested.clone(),
                WatchedPath {
                    requested: requested.clone(),
                    resolved,
                    subscription: Some(subscription),
                },
            );
            watched.push(requested.clone());
        }

        watched
    }

    /// Cancel every active subscription and clear the active mapping.
    ///
    /// Each cancellation is awaited before this returns, so no further
    /// events from these watches are delivered afterwards. Safe to call when
    /// nothing is active.
    pub async fn stop_all(&mut self) {
        for (_, mut watched) in self.active.drain() {
            if let Some(subscription) = watched.subscription.take() {
                subscription.cancel().await;
                debug!(path = %watched.requested, "watch cancelled");
            }
        }
    }
}
