// src/logging.rs

//! Diagnostics for the daemon itself go to stderr through `tracing`.
//! Spawned commands inherit stdout and stderr, so their output interleaves
//! with ours.
//!
//! The level is the `--log-level` flag if given, else `CALLBACKD_LOG`, else
//! `info`. An unreadable `CALLBACKD_LOG` falls back to `info` rather than
//! keeping the daemon from starting.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "CALLBACKD_LOG";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = resolve_level(cli_level, std::env::var(LOG_ENV).ok().as_deref());

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}

fn resolve_level(cli_level: Option<LogLevel>, env_value: Option<&str>) -> Level {
    if let Some(level) = cli_level {
        return level.into();
    }
    env_value.and_then(parse_level).unwrap_or(Level::INFO)
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

fn parse_level(raw: &str) -> Option<Level> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("warning") {
        return Some(Level::WARN);
    }
    raw.parse().ok()
}
