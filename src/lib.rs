// src/lib.rs

pub mod cli;
pub mod config;
pub mod debounce;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod reloader;
pub mod remote;
pub mod resolve;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::errors::Result;

pub use crate::reloader::{
    Reloader, ReloaderConfig, ReloaderState, DEFAULT_DEBOUNCE_INTERVAL, DEFAULT_SERVICE_URL,
};
pub use crate::types::{ChangeEvent, ChangeKind};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - reloader construction with the production backends
/// - path registration from config + CLI
/// - reload-completion logging
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_config(&config_path)?;

    let mut reloader_cfg = cfg.reloader_config();
    if let Some(url) = args.service_url.clone() {
        reloader_cfg.service_url = Some(url);
    }
    if let Some(ms) = args.debounce_ms {
        reloader_cfg.debounce_interval = Duration::from_millis(ms);
    }

    if args.dry_run {
        print_dry_run(&cfg, &args, &reloader_cfg);
        return Ok(());
    }

    let mut reloader = Reloader::new(reloader_cfg)?;

    for path in &cfg.watch.paths {
        reloader.register_path(path.clone())?;
    }
    for glob in &cfg.watch.globs {
        let count = reloader.register_glob(glob)?;
        debug!(glob = %glob, count, "glob expanded");
    }
    if cfg.watch.package_dependencies {
        let count = reloader.register_package_dependencies()?;
        debug!(count, "package dependencies registered");
    }
    for path in &args.paths {
        reloader.register_path(path.clone())?;
    }

    let watched = reloader.start().await?;
    if watched.is_empty() {
        warn!("nothing resolved to a watchable path; reloads will never trigger");
    } else {
        info!(?watched, "watching for changes");
    }

    // Log each completed reload from the notification stream.
    let mut reloads = reloader.subscribe_reloads()?;
    tokio::spawn(async move {
        loop {
            match reloads.recv().await {
                Ok(at) => info!(at = ?at, "reload completed"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    reloader.terminate().await?;
    Ok(())
}

/// Load the config file, falling back to defaults when the default config
/// path simply doesn't exist.
fn load_config(path: &Path) -> Result<ConfigFile> {
    if path.is_file() {
        load_and_validate(path)
    } else {
        debug!(path = ?path, "no config file; using defaults");
        Ok(ConfigFile::default())
    }
}

/// Simple dry-run output: print endpoint, interval and registrations.
fn print_dry_run(cfg: &ConfigFile, args: &CliArgs, reloader_cfg: &ReloaderConfig) {
    println!("watchreload dry-run");
    match &reloader_cfg.service_url {
        Some(url) => println!("  remote.url = {url}"),
        None => println!("  remote disabled (hot reload unavailable)"),
    }
    println!(
        "  watch.debounce = {}ms",
        reloader_cfg.debounce_interval.as_millis()
    );

    println!("paths ({}):", cfg.watch.paths.len() + args.paths.len());
    for path in cfg.watch.paths.iter().chain(args.paths.iter()) {
        println!("  - {path}");
    }
    if !cfg.watch.globs.is_empty() {
        println!("globs ({}):", cfg.watch.globs.len());
        for glob in &cfg.watch.globs {
            println!("  - {glob}");
        }
    }
    if cfg.watch.package_dependencies {
        println!("  (plus transitive package dependencies)");
    }

    debug!("dry-run complete (nothing started)");
}
