// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `watchreload`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchreload",
    version,
    about = "Watch paths and hot-reload a remote process when they change.",
    long_about = None
)]
pub struct CliArgs {
    /// Additional paths to watch, appended to the config's list.
    #[arg(value_name = "PATH")]
    pub paths: Vec<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Watchreload.toml` in the current working directory. A
    /// missing default config is not an error; built-in defaults apply.
    #[arg(long, value_name = "PATH", default_value = "Watchreload.toml")]
    pub config: String,

    /// Remote-control endpoint, overriding the config file.
    #[arg(long, value_name = "URL")]
    pub service_url: Option<String>,

    /// Debounce interval in milliseconds, overriding the config file.
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHRELOAD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print what would be watched, but don't start.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
