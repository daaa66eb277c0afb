// tests/reloader_lifecycle.rs

//! Reloader state machine: construction capability check, restart
//! semantics, and terminal absorption.

mod common;
use crate::common::{init_tracing, rig, test_config};

use std::path::Path;
use std::time::Duration;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use watchreload::errors::ReloadError;
use watchreload::reloader::{Reloader, ReloaderState};
use watchreload_test_utils::fake_remote::ReloadOutcome;

const DEBOUNCE: Duration = Duration::from_millis(50);

#[tokio::test]
async fn construction_requires_a_remote_endpoint() {
    init_tracing();

    let mut config = test_config(DEBOUNCE);
    config.service_url = None;

    let err = Reloader::new(config).expect_err("must not construct");
    assert!(matches!(err, ReloadError::Config(_)));
}

#[tokio::test]
async fn construction_rejects_a_non_websocket_endpoint() {
    init_tracing();

    let mut config = test_config(DEBOUNCE);
    config.service_url = Some("http://localhost:8181/ws".to_string());

    let err = Reloader::new(config).expect_err("must not construct");
    assert!(matches!(err, ReloadError::Config(_)));
}

#[tokio::test]
async fn capability_and_state_queries() {
    init_tracing();
    let mut rig = rig(DEBOUNCE, ReloadOutcome::Success);

    assert!(rig.reloader.is_hot_reloadable());
    assert_eq!(rig.reloader.state(), ReloaderState::Idle);
    assert!(!rig.reloader.is_running());

    rig.fs.add_dir("/work/a");
    rig.reloader.register_path("/work/a").unwrap();
    rig.reloader.start().await.unwrap();

    assert_eq!(rig.reloader.state(), ReloaderState::Running);
    assert!(rig.reloader.is_running());
    assert!(rig.reloader.is_watching("/work/a"));
}

#[tokio::test]
async fn restart_rebuilds_the_registry_once_per_start() {
    init_tracing();
    let mut rig = rig(DEBOUNCE, ReloadOutcome::Success);
    rig.fs.add_dir("/work/a");
    rig.fs.add_dir("/work/b");

    rig.reloader.register_path("/work/a").unwrap();
    let watched = rig.reloader.start().await.unwrap();
    assert_eq!(watched, vec!["/work/a".to_string()]);
    assert_eq!(rig.watcher.watch_calls(), 1);

    // Second start without an intervening stop: restart semantics.
    rig.reloader.register_path("/work/b").unwrap();
    let watched = rig.reloader.start().await.unwrap();
    assert_eq!(
        watched,
        vec!["/work/a".to_string(), "/work/b".to_string()]
    );
    assert!(rig.reloader.is_watching("/work/a"));
    assert!(rig.reloader.is_watching("/work/b"));
    // Exactly one rebuild per start: 1 watch, then 2 more.
    assert_eq!(rig.watcher.watch_calls(), 3);
}

#[tokio::test]
async fn stop_leaves_streams_open_and_reloader_restartable() {
    init_tracing();
    let mut rig = rig(DEBOUNCE, ReloadOutcome::Success);
    rig.fs.add_dir("/work/a");
    rig.reloader.register_path("/work/a").unwrap();

    rig.reloader.start().await.unwrap();
    rig.reloader.stop().await.unwrap();

    assert_eq!(rig.reloader.state(), ReloaderState::Idle);
    assert!(!rig.reloader.is_watching("/work/a"));
    assert!(!rig.watcher.is_active(Path::new("/work/a")));

    // Streams survive a stop.
    assert!(rig.reloader.subscribe_changes().is_ok());
    assert!(rig.reloader.subscribe_reloads().is_ok());

    // And the reloader can start again.
    rig.reloader.start().await.unwrap();
    assert!(rig.reloader.is_watching("/work/a"));

    // stop() with nothing active is harmless too.
    rig.reloader.stop().await.unwrap();
    rig.reloader.stop().await.unwrap();
}

#[tokio::test]
async fn terminate_is_absorbing() {
    init_tracing();
    let mut rig = rig(DEBOUNCE, ReloadOutcome::Success);
    rig.fs.add_dir("/work/a");
    rig.reloader.register_path("/work/a").unwrap();
    rig.reloader.start().await.unwrap();

    let mut changes = rig.reloader.subscribe_changes().unwrap();
    let mut reloads = rig.reloader.subscribe_reloads().unwrap();

    rig.reloader.terminate().await.unwrap();
    assert_eq!(rig.reloader.state(), ReloaderState::Terminated);
    assert!(!rig.watcher.is_active(Path::new("/work/a")));

    // Every subsequent operation fails with the terminated error.
    assert!(matches!(
        rig.reloader.start().await,
        Err(ReloadError::AlreadyTerminated)
    ));
    assert!(matches!(
        rig.reloader.stop().await,
        Err(ReloadError::AlreadyTerminated)
    ));
    assert!(matches!(
        rig.reloader.reload().await,
        Err(ReloadError::AlreadyTerminated)
    ));
    assert!(matches!(
        rig.reloader.register_path("/work/b"),
        Err(ReloadError::AlreadyTerminated)
    ));
    assert!(matches!(
        rig.reloader.terminate().await,
        Err(ReloadError::AlreadyTerminated)
    ));
    assert!(matches!(
        rig.reloader.subscribe_changes(),
        Err(ReloadError::AlreadyTerminated)
    ));

    // Existing receivers observe closure.
    assert!(matches!(changes.recv().await, Err(RecvError::Closed)));
    assert!(matches!(reloads.try_recv(), Err(TryRecvError::Closed)));

    // No reload was ever issued.
    assert!(rig.remote.lock().unwrap().reload_calls.is_empty());
}
