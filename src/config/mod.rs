// src/config/mod.rs

//! Configuration loading for the `watchreload` CLI.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, RemoteSection, WatchSection};
