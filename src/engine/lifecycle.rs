// src/engine/lifecycle.rs

use std::fmt;
use std::future::Future;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::CommandMapping;
use crate::errors::{CallbackdError, Result};
use crate::events::EventSource;
use crate::exec::TaskTracker;

use super::router::configure;
use super::{LifecycleState, Shutdown, ShutdownSignal};

/// Owns the event source's listening task and drives it from start to stop.
///
/// `new` configures the router (`Created`); `run` spawns the listener
/// (`Running`), races it against the shutdown future, cancels it if the
/// shutdown future wins (`Stopping`) and waits for it to settle (`Stopped`).
///
/// Commands still running at shutdown are left alone; their processes are
/// not killed.
pub struct Lifecycle<S: EventSource> {
    source: S,
    tracker: TaskTracker,
    handlers: usize,
    state: watch::Sender<LifecycleState>,
}

impl<S: EventSource> fmt::Debug for Lifecycle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("state", &self.state())
            .field("handlers", &self.handlers)
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}

impl<S: EventSource> Lifecycle<S> {
    /// Bind every mapping entry on `source`. Nothing is listening yet.
    pub fn new(mut source: S, mapping: &CommandMapping, tracker: TaskTracker) -> Result<Self> {
        let handlers = configure(mapping, &mut source, &tracker)?;
        let (state, _) = watch::channel(LifecycleState::Created);
        Ok(Self {
            source,
            tracker,
            handlers,
            state,
        })
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Follow state transitions (e.g. from tests or a status reporter).
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Number of handlers registered on the source.
    pub fn handlers(&self) -> usize {
        self.handlers
    }

    /// Run until `shutdown` resolves or the listener ends by itself.
    ///
    /// - shutdown first: the listener is aborted, `Ok(Shutdown::Signal)`
    /// - listener returns `Ok`: `Ok(Shutdown::SourceFinished)`
    /// - listener returns an error or panics: `Err`
    pub async fn run<F>(self, shutdown: F) -> Result<Shutdown>
    where
        F: Future<Output = ShutdownSignal>,
    {
        let Self {
            mut source,
            tracker,
            state,
            ..
        } = self;

        let mut listener = tokio::spawn(async move { source.listen_for_events().await });
        state.send_replace(LifecycleState::Running);
        info!("listening for events");

        let outcome = tokio::select! {
            joined = &mut listener => {
                state.send_replace(LifecycleState::Stopping);
                match joined {
                    Ok(Ok(())) => {
                        info!("event source finished");
                        Ok(Shutdown::SourceFinished)
                    }
                    Ok(Err(err)) => Err(err),
                    Err(join_err) => Err(CallbackdError::ListenerError(join_err.to_string())),
                }
            }
            signal = shutdown => {
                state.send_replace(LifecycleState::Stopping);
                info!(%signal, "shutdown requested; cancelling event listener");
                listener.abort();
                match listener.await {
                    Err(join_err) if join_err.is_cancelled() => Ok(Shutdown::Signal(signal)),
                    // The listener completed before the abort took effect.
                    Ok(Ok(())) => Ok(Shutdown::Signal(signal)),
                    Ok(Err(err)) => Err(err),
                    Err(join_err) => Err(CallbackdError::ListenerError(join_err.to_string())),
                }
            }
        };

        let in_flight = tracker.in_flight();
        if in_flight > 0 {
            warn!(in_flight, "exiting with commands still running; they are not killed");
        }

        state.send_replace(LifecycleState::Stopped);
        if let Ok(how) = &outcome {
            info!(?how, "stopped");
        }
        outcome
    }
}
