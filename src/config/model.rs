// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::reloader::{ReloaderConfig, DEFAULT_DEBOUNCE_INTERVAL, DEFAULT_SERVICE_URL};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [remote]
/// url = "ws://localhost:8181/ws"
///
/// [watch]
/// paths = ["src", "assets"]
/// globs = ["lib/**/*.rs"]
/// debounce_ms = 5000
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    /// Remote-control endpoint settings from `[remote]`.
    #[serde(default)]
    pub remote: RemoteSection,

    /// What to watch, from `[watch]`.
    #[serde(default)]
    pub watch: WatchSection,
}

/// `[remote]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSection {
    /// Whether the target process was launched with remote control enabled.
    /// With `enabled = false` the reloader refuses to construct.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Control endpoint URL.
    #[serde(default = "default_service_url")]
    pub url: String,
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            url: default_service_url(),
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Plain paths to watch.
    #[serde(default)]
    pub paths: Vec<String>,

    /// Glob patterns expanded against the working directory.
    #[serde(default)]
    pub globs: Vec<String>,

    /// Quiescence window in milliseconds. `0` is legal and means one reload
    /// trigger per change event.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Package manifest for `package:` registration and dependency watching.
    #[serde(default)]
    pub package_manifest: Option<PathBuf>,

    /// Also watch every transitive dependency of the manifest's root
    /// package.
    #[serde(default)]
    pub package_dependencies: bool,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            globs: Vec::new(),
            debounce_ms: default_debounce_ms(),
            package_manifest: None,
            package_dependencies: false,
        }
    }
}

impl ConfigFile {
    /// Derive the reloader's construction config from this file.
    pub fn reloader_config(&self) -> ReloaderConfig {
        ReloaderConfig {
            service_url: self.remote.enabled.then(|| self.remote.url.clone()),
            debounce_interval: Duration::from_millis(self.watch.debounce_ms),
            package_manifest: self.watch.package_manifest.clone(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_INTERVAL.as_millis() as u64
}
