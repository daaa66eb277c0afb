// tests/common/mod.rs

#![allow(dead_code)]

pub use watchreload_test_utils::{init_tracing, with_timeout};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use watchreload::fs::mock::MockFileSystem;
use watchreload::reloader::{Reloader, ReloaderConfig};
use watchreload::watch::MockWatcher;
use watchreload_test_utils::fake_remote::{FakeConnector, FakeRemoteState, ReloadOutcome};

pub fn test_config(debounce: Duration) -> ReloaderConfig {
    ReloaderConfig {
        service_url: Some("ws://localhost:8181/ws".to_string()),
        debounce_interval: debounce,
        package_manifest: None,
    }
}

/// A reloader wired to mock backends, plus handles onto their state.
pub struct TestRig {
    pub reloader: Reloader,
    pub watcher: MockWatcher,
    pub fs: MockFileSystem,
    pub remote: Arc<Mutex<FakeRemoteState>>,
}

/// Build a reloader over a mock watcher, mock filesystem and scripted remote.
///
/// Must be called from within a Tokio runtime.
pub fn rig(debounce: Duration, outcome: ReloadOutcome) -> TestRig {
    rig_with(test_config(debounce), outcome)
}

pub fn rig_with(config: ReloaderConfig, outcome: ReloadOutcome) -> TestRig {
    build_rig(config, FakeConnector::new(outcome))
}

/// Like [`rig`], but over a caller-prepared connector (custom target lists
/// and the like).
pub fn rig_with_connector(debounce: Duration, connector: FakeConnector) -> TestRig {
    build_rig(test_config(debounce), connector)
}

fn build_rig(config: ReloaderConfig, connector: FakeConnector) -> TestRig {
    let watcher = MockWatcher::new();
    let fs = MockFileSystem::new();
    let remote = connector.state();

    let reloader = Reloader::with_backends(
        config,
        Arc::new(watcher.clone()),
        Box::new(connector),
        Arc::new(fs.clone()),
    )
    .expect("reloader construction");

    TestRig {
        reloader,
        watcher,
        fs,
        remote,
    }
}
