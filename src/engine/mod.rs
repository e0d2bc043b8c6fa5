// src/engine/mod.rs

//! Dispatch engine for callbackd.
//!
//! This module ties together:
//! - the event router (one binding per configured event → command pair)
//! - the lifecycle controller that owns the listening task
//! - OS signal handling that turns SIGINT / SIGTERM / SIGPIPE into
//!   cancellation of that task
//!
//! Command execution itself lives in [`crate::exec`].

use std::fmt;

/// Lifecycle of the daemon. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    /// Router configured, listening task not started yet.
    Created,
    /// Listening task scheduled; signals wired to its cancellation.
    Running,
    /// A signal fired or the listener ended; waiting for it to settle.
    Stopping,
    /// Listener gone; the process is about to exit.
    Stopped,
}

/// Signals that request a graceful shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
    BrokenPipe,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShutdownSignal::Interrupt => "SIGINT",
            ShutdownSignal::Terminate => "SIGTERM",
            ShutdownSignal::BrokenPipe => "SIGPIPE",
        };
        f.write_str(name)
    }
}

/// How a clean run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// The listening task was cancelled because of a signal.
    Signal(ShutdownSignal),
    /// The event source finished on its own without error.
    SourceFinished,
}

pub mod lifecycle;
pub mod router;
pub mod signals;

pub use lifecycle::Lifecycle;
pub use router::{configure, Binding};
pub use signals::ShutdownSignals;
