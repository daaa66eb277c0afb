// tests/registry_watch.rs

//! Watch registry behaviour over the mock watcher backend.

mod common;
use crate::common::{init_tracing, with_timeout};

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;

use watchreload::fs::mock::MockFileSystem;
use watchreload::types::{ChangeEvent, ChangeKind};
use watchreload::watch::{MockWatcher, WatchRegistry};

fn registry(fs: &MockFileSystem, watcher: &MockWatcher) -> WatchRegistry {
    WatchRegistry::new(Arc::new(fs.clone()), Arc::new(watcher.clone()))
}

#[tokio::test]
async fn register_is_idempotent() {
    init_tracing();
    let fs = MockFileSystem::new();
    let watcher = MockWatcher::new();
    let mut registry = registry(&fs, &watcher);

    registry.register("/work/a");
    registry.register("/work/a");

    assert_eq!(registry.registered_paths(), vec!["/work/a".to_string()]);
}

#[tokio::test]
async fn build_skips_unresolvable_paths() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_dir("/work/a");

    let watcher = MockWatcher::new();
    let mut registry = registry(&fs, &watcher);
    registry.register("/work/a");
    registry.register("/work/missing");

    let (sink, _rx) = mpsc::channel::<ChangeEvent>(16);
    let watched = registry.build(&sink);

    assert_eq!(watched, vec!["/work/a".to_string()]);
    assert!(registry.is_watching("/work/a"));
    assert!(!registry.is_watching("/work/missing"));
    assert!(watcher.is_active(Path::new("/work/a")));
}

#[tokio::test]
async fn build_replaces_prior_mapping_wholesale() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_dir("/work/a");
    fs.add_dir("/work/b");

    let watcher = MockWatcher::new();
    let mut registry = registry(&fs, &watcher);
    registry.register("/work/a");

    let (sink, _rx) = mpsc::channel::<ChangeEvent>(16);
    registry.build(&sink);
    assert_eq!(watcher.watch_calls(), 1);

    registry.register("/work/b");
    registry.stop_all().await;
    let watched = registry.build(&sink);

    assert_eq!(
        watched,
        vec!["/work/a".to_string(), "/work/b".to_string()]
    );
    // One watch per path per build: 1 for the first, 2 for the second.
    assert_eq!(watcher.watch_calls(), 3);
}

#[tokio::test]
async fn events_flow_into_the_shared_sink() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_dir("/work/a");

    let watcher = MockWatcher::new();
    let mut registry = registry(&fs, &watcher);
    registry.register("/work/a");

    let (sink, mut rx) = mpsc::channel::<ChangeEvent>(16);
    registry.build(&sink);

    assert!(watcher.emit(Path::new("/work/a"), ChangeKind::Modified));
    let event = with_timeout(rx.recv()).await.expect("event forwarded");
    assert_eq!(
        event,
        ChangeEvent::new("/work/a", ChangeKind::Modified)
    );
}

#[tokio::test]
async fn stop_all_cancels_every_subscription() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_dir("/work/a");
    fs.add_dir("/work/b");

    let watcher = MockWatcher::new();
    let mut registry = registry(&fs, &watcher);
    registry.register("/work/a");
    registry.register("/work/b");

    let (sink, _rx) = mpsc::channel::<ChangeEvent>(16);
    registry.build(&sink);
    assert_eq!(registry.watched_paths().len(), 2);

    registry.stop_all().await;

    assert!(registry.watched_paths().is_empty());
    assert!(!registry.is_watching("/work/a"));
    assert!(!watcher.is_active(Path::new("/work/a")));
    assert!(!watcher.is_active(Path::new("/work/b")));
    // No further events can be injected once cancellation completes.
    assert!(!watcher.emit(Path::new("/work/a"), ChangeKind::Removed));

    // Safe to call again with nothing active.
    registry.stop_all().await;
}
