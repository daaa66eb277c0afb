// src/config/validate.rs

//! Semantic validation on top of TOML deserialization.

use url::Url;

use crate::config::model::ConfigFile;
use crate::errors::{ReloadError, Result};

/// Check the parts of a config that TOML parsing alone can't.
pub fn validate_config(config: &ConfigFile) -> Result<()> {
    if config.remote.enabled {
        validate_service_url(&config.remote.url)?;
    }
    Ok(())
}

/// The control endpoint must be a well-formed WebSocket URL.
pub fn validate_service_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url)
        .map_err(|err| ReloadError::Config(format!("invalid service URL '{url}': {err}")))?;
    match parsed.scheme() {
        "ws" | "wss" => Ok(()),
        other => Err(ReloadError::Config(format!(
            "service URL '{url}' must use ws:// or wss://, got '{other}'"
        ))),
    }
}
