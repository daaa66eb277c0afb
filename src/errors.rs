// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReloadError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Reloader already terminated")]
    AlreadyTerminated,

    #[error("Invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("Not a package URI: {0}")]
    NotAPackageUri(String),

    #[error("Package not found: {0}")]
    PackageNotFound(String),

    #[error("Remote process reported no reloadable targets")]
    NoReloadTarget,

    #[error("Reload rejected by remote process: {detail}")]
    ReloadRejected { detail: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ReloadError>;
