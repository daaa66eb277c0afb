// src/watch/mock.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use super::backend::{PathWatcher, WatchSubscription};
use crate::errors::Result;
use crate::types::{ChangeEvent, ChangeKind};

/// Test watcher backend with hand-injected events.
///
/// Each `watch` call registers an injector under the watched path; tests use
/// [`MockWatcher::emit`] to push events through the normal forwarding path.
/// Cancelling a subscription removes the injector, so `emit` returning
/// `false` doubles as an "is this still watched" probe.
#[derive(Debug, Clone, Default)]
pub struct MockWatcher {
    inner: Arc<Mutex<MockWatcherState>>,
}

#[derive(Debug, Default)]
struct MockWatcherState {
    active: HashMap<PathBuf, mpsc::UnboundedSender<ChangeEvent>>,
    watch_calls: usize,
}

impl MockWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of `watch` calls across all registry rebuilds.
    pub fn watch_calls(&self) -> usize {
        self.inner.lock().unwrap().watch_calls
    }

    /// Whether a subscription for `path` is currently live.
    pub fn is_active(&self, path: &Path) -> bool {
        self.inner.lock().unwrap().active.contains_key(path)
    }

    /// Inject an event into the subscription watching `path`.
    ///
    /// Returns `false` if no live subscription covers that path.
    pub fn emit(&self, path: &Path, kind: ChangeKind) -> bool {
        let state = self.inner.lock().unwrap();
        match state.active.get(path) {
            Some(tx) => tx.send(ChangeEvent::new(path, kind)).is_ok(),
            None => false,
        }
    }
}

/// Removes the path's injector when the subscription is cancelled/dropped.
struct MockGuard {
    path: PathBuf,
    inner: Arc<Mutex<MockWatcherState>>,
}

impl Drop for MockGuard {
    fn drop(&mut self) {
        if let Ok(mut state) = self.inner.lock() {
            state.active.remove(&self.path);
        }
    }
}

impl PathWatcher for MockWatcher {
    fn watch(&self, path: &Path, sink: mpsc::Sender<ChangeEvent>) -> Result<WatchSubscription> {
        let (raw_tx, mut raw_rx) = mpsc::unbounded_channel::<ChangeEvent>();

        {
            let mut state = self.inner.lock().unwrap();
            state.watch_calls += 1;
            state.active.insert(path.to_path_buf(), raw_tx);
        }

        let forward = tokio::spawn(async move {
            while let Some(event) = raw_rx.recv().await {
                if sink.send(event).await.is_err() {
                    return;
                }
            }
        });

        let guard = MockGuard {
            path: path.to_path_buf(),
            inner: Arc::clone(&self.inner),
        };
        Ok(WatchSubscription::new(Box::new(guard), forward))
    }
}
