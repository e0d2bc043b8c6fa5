// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod exec;
pub mod logging;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_and_validate, CommandMapping};
use crate::engine::{router, Lifecycle, Shutdown, ShutdownSignals};
use crate::errors::{CallbackdError, Result};
use crate::events::{QubesEventSource, QubesSourceOptions, Transport};
use crate::exec::{ProcessInvoker, TaskTracker};

/// What a successful [`run`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// `--dry-run`: the bindings were printed and no source was started.
    DryRun,
    /// The daemon listened for events until it was stopped.
    Stopped(Shutdown),
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (fatal before any handler is registered)
/// - the qubesd event source
/// - task tracker + process invoker
/// - router registration and the lifecycle controller
/// - SIGINT / SIGTERM / SIGPIPE handling
pub async fn run(args: CliArgs) -> Result<RunOutcome> {
    let config_path = match args.config.clone() {
        Some(path) => path,
        None => default_config_path()?,
    };
    let mapping = load_and_validate(&config_path).map_err(|err| match err {
        CallbackdError::ConfigError(msg) => CallbackdError::ConfigError(format!(
            "{msg} (in {})",
            config_path.display()
        )),
        other => other,
    })?;
    info!(config = %config_path.display(), entries = mapping.len(), "configuration loaded");

    if args.dry_run {
        print_dry_run(&mapping);
        return Ok(RunOutcome::DryRun);
    }

    let source = QubesEventSource::new(source_options(&args)?);
    let tracker = TaskTracker::new(Arc::new(ProcessInvoker));
    let lifecycle = Lifecycle::new(source, &mapping, tracker)?;

    // Installed before the listener starts so no signal is missed.
    let signals = ShutdownSignals::register()?;

    let shutdown = lifecycle.run(signals.recv()).await?;
    Ok(RunOutcome::Stopped(shutdown))
}

fn source_options(args: &CliArgs) -> Result<QubesSourceOptions> {
    let reconnect_delay = Duration::try_from_secs_f64(args.reconnect_delay).map_err(|e| {
        CallbackdError::ConfigError(format!(
            "invalid --reconnect-delay {}: {e}",
            args.reconnect_delay
        ))
    })?;

    Ok(QubesSourceOptions {
        transport: Transport::detect(args.socket.clone()),
        dest: args.dest.clone(),
        reconnect: !args.no_reconnect,
        reconnect_delay,
    })
}

/// Simple dry-run output: print every event pattern and its command.
fn print_dry_run(mapping: &CommandMapping) {
    println!("callbackd dry-run");
    println!();

    println!("bindings ({}):", mapping.len());
    for binding in router::bindings(mapping) {
        println!("  - {}", binding.pattern);
        println!("      cmd: {}", binding.template);
    }

    debug!("dry-run complete (no events received)");
}
