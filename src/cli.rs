// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::events::qubes::DEFAULT_DEST;

/// Command-line arguments for `callbackd`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "callbackd",
    version,
    about = "Run configured commands when Qubes OS events (VM started etc.) occur.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (JSON object of event -> command).
    ///
    /// Default: `callbackd.json` next to the executable.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to the qubesd socket.
    ///
    /// If omitted, `/var/run/qubesd.sock` is used when it exists; otherwise
    /// events are requested through `qrexec-client-vm`.
    #[arg(long, value_name = "PATH")]
    pub socket: Option<PathBuf>,

    /// Only receive events of this VM (`dom0` receives all events).
    #[arg(long = "vm", value_name = "NAME", default_value = DEFAULT_DEST)]
    pub dest: String,

    /// Seconds to wait before reconnecting to qubesd.
    #[arg(long, value_name = "SECS", default_value_t = 1.0)]
    pub reconnect_delay: f64,

    /// Exit instead of reconnecting when the connection to qubesd fails.
    #[arg(long)]
    pub no_reconnect: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CALLBACKD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate the config, print the bindings, but don't listen.
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
