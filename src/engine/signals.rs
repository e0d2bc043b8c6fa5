// src/engine/signals.rs

//! OS signal handling.
//!
//! [`ShutdownSignals::register`] installs the handlers synchronously, so no
//! signal can slip through between startup and the moment the daemon starts
//! waiting. [`ShutdownSignals::recv`] then completes on the first of:
//!
//! - **SIGINT** (Ctrl-C in terminal)
//! - **SIGTERM** (default kill signal, used by systemd)
//! - **SIGPIPE** (output pipe closed, e.g. `callbackd | head`)
//!
//! On non-Unix platforms only Ctrl-C is awaited.

use super::ShutdownSignal;

#[cfg(unix)]
pub struct ShutdownSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    broken_pipe: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    /// Install the signal handlers. Must be called within a Tokio runtime.
    pub fn register() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            broken_pipe: signal(SignalKind::pipe())?,
        })
    }

    /// Wait for the first shutdown signal.
    pub async fn recv(mut self) -> ShutdownSignal {
        tokio::select! {
            _ = self.interrupt.recv() => ShutdownSignal::Interrupt,
            _ = self.terminate.recv() => ShutdownSignal::Terminate,
            _ = self.broken_pipe.recv() => ShutdownSignal::BrokenPipe,
        }
    }
}

#[cfg(not(unix))]
pub struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    pub fn register() -> std::io::Result<Self> {
        Ok(Self)
    }

    pub async fn recv(self) -> ShutdownSignal {
        if tokio::signal::ctrl_c().await.is_err() {
            // No way to learn about Ctrl-C; never request shutdown.
            std::future::pending::<()>().await;
        }
        ShutdownSignal::Interrupt
    }
}
