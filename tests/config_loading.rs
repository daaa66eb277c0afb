// tests/config_loading.rs

//! TOML config parsing, defaults and validation.

use std::fs;
use std::time::Duration;

use watchreload::config::loader::{load_and_validate, load_from_path};
use watchreload::errors::ReloadError;
use watchreload::reloader::{DEFAULT_DEBOUNCE_INTERVAL, DEFAULT_SERVICE_URL};

fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Watchreload.toml");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn parses_a_full_config() {
    let (_dir, path) = write_config(
        r#"
[remote]
url = "ws://127.0.0.1:9000/control"

[watch]
paths = ["src", "assets"]
globs = ["lib/**/*.rs"]
debounce_ms = 250
package_manifest = "packages.json"
package_dependencies = true
"#,
    );

    let cfg = load_and_validate(&path).unwrap();
    assert_eq!(cfg.remote.url, "ws://127.0.0.1:9000/control");
    assert_eq!(cfg.watch.paths, vec!["src", "assets"]);
    assert_eq!(cfg.watch.globs, vec!["lib/**/*.rs"]);
    assert_eq!(cfg.watch.debounce_ms, 250);
    assert!(cfg.watch.package_dependencies);

    let reloader_cfg = cfg.reloader_config();
    assert_eq!(
        reloader_cfg.service_url.as_deref(),
        Some("ws://127.0.0.1:9000/control")
    );
    assert_eq!(reloader_cfg.debounce_interval, Duration::from_millis(250));
    assert_eq!(
        reloader_cfg.package_manifest.as_deref(),
        Some(std::path::Path::new("packages.json"))
    );
}

#[test]
fn defaults_apply_for_missing_sections() {
    let (_dir, path) = write_config("");

    let cfg = load_and_validate(&path).unwrap();
    assert!(cfg.remote.enabled);
    assert_eq!(cfg.remote.url, DEFAULT_SERVICE_URL);
    assert!(cfg.watch.paths.is_empty());
    assert_eq!(
        u128::from(cfg.watch.debounce_ms),
        DEFAULT_DEBOUNCE_INTERVAL.as_millis()
    );
}

#[test]
fn rejects_a_non_websocket_url() {
    let (_dir, path) = write_config(
        r#"
[remote]
url = "http://localhost:8181/ws"
"#,
    );

    let err = load_and_validate(&path).expect_err("must fail validation");
    assert!(matches!(err, ReloadError::Config(_)));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let (_dir, path) = write_config("[remote\nurl = nope");

    let err = load_from_path(&path).expect_err("must fail to parse");
    assert!(matches!(err, ReloadError::Toml(_)));
}

#[test]
fn disabled_remote_yields_no_service_url() {
    let (_dir, path) = write_config(
        r#"
[remote]
enabled = false
"#,
    );

    let cfg = load_and_validate(&path).unwrap();
    assert!(cfg.reloader_config().service_url.is_none());
}
