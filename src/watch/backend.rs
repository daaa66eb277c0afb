// src/watch/backend.rs

//! Watcher backend abstraction.
//!
//! The registry talks to a [`PathWatcher`] instead of `notify` directly.
//! This makes it easy to swap in a mock backend in tests while keeping the
//! production implementation in [`NotifyWatcher`].

use std::any::Any;
use std::path::Path;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::errors::Result;
use crate::types::{ChangeEvent, ChangeKind};

/// Handle for one active per-path watch.
///
/// The guard keeps the underlying platform watcher alive; dropping it stops
/// event production. The forwarding task drains whatever the watcher already
/// produced and then ends once the guard is gone.
pub struct WatchSubscription {
    _guard: Box<dyn Any + Send>,
    forward: JoinHandle<()>,
}

impl std::fmt::Debug for WatchSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSubscription").finish()
    }
}

impl WatchSubscription {
    pub fn new(guard: Box<dyn Any + Send>, forward: JoinHandle<()>) -> Self {
        Self {
            _guard: guard,
            forward,
        }
    }

    /// Stop event delivery and wait for the forwarding task to wind down.
    ///
    /// Any events produced before cancellation are still delivered to the
    /// sink before this returns; none arrive afterwards.
    pub async fn cancel(self) {
        let WatchSubscription { _guard, forward } = self;
        drop(_guard);
        let _ = forward.await;
    }
}

/// Trait abstracting how a single path is watched.
///
/// Production code uses [`NotifyWatcher`]; tests can provide a
/// [`mock::MockWatcher`](super::mock::MockWatcher) with hand-injected events.
pub trait PathWatcher: Send + Sync {
    /// Begin watching `path`, forwarding mapped events into `sink` until the
    /// returned subscription is cancelled.
    fn watch(&self, path: &Path, sink: mpsc::Sender<ChangeEvent>) -> Result<WatchSubscription>;
}

/// Real watcher backend built on `notify`.
#[derive(Debug, Clone, Default)]
pub struct NotifyWatcher;

impl PathWatcher for NotifyWatcher {
    fn watch(&self, path: &Path, sink: mpsc::Sender<ChangeEvent>) -> Result<WatchSubscription> {
        // Channel from the blocking notify callback into the async world.
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

        // Closure called synchronously by notify whenever an event arrives.
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    // A send failure means the subscription was cancelled.
                    let _ = event_tx.send(event);
                }
                Err(err) => {
                    // We can't log via tracing here easily, so fallback to stderr.
                    eprintln!("watchreload: file watch error: {err}");
                }
            },
            Config::default(),
        )
        .map_err(anyhow::Error::from)?;

        watcher
            .watch(path, RecursiveMode::Recursive)
            .map_err(anyhow::Error::from)?;

        // Async task that maps notify events and forwards them to the sink.
        let forward = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                let Some(kind) = change_kind(&event.kind) else {
                    continue;
                };
                for path in event.paths {
                    if sink.send(ChangeEvent { path, kind }).await.is_err() {
                        // Sink closed; nothing left to forward to.
                        return;
                    }
                }
            }
        });

        Ok(WatchSubscription::new(Box::new(watcher), forward))
    }
}

/// Map a notify event kind onto ours; access/metadata-only kinds are dropped.
fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        _ => None,
    }
}
