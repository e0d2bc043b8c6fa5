use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use callbackd::errors::{CallbackdError, Result};
use callbackd::events::{EventHandler, EventOccurrence, EventSource, HandlerRegistry};

/// What the fake source should do next while listening.
#[derive(Debug)]
pub enum SourceStep {
    /// Deliver an occurrence to the matching handlers.
    Event(EventOccurrence),
    /// Stop listening with a listener error.
    Fail(String),
    /// Stop listening successfully.
    Finish,
}

/// An event source fed from the test through a [`FakeEventFeed`].
///
/// While listening it delivers scripted occurrences in order. Once the feed
/// is dropped it keeps waiting, like a live connection, until cancelled.
pub struct FakeEventSource {
    handlers: HandlerRegistry,
    steps: mpsc::UnboundedReceiver<SourceStep>,
}

/// Test-side handle that scripts a [`FakeEventSource`].
#[derive(Clone)]
pub struct FakeEventFeed {
    tx: mpsc::UnboundedSender<SourceStep>,
}

pub fn fake_source() -> (FakeEventSource, FakeEventFeed) {
    let (tx, steps) = mpsc::unbounded_channel();
    (
        FakeEventSource {
            handlers: HandlerRegistry::new(),
            steps,
        },
        FakeEventFeed { tx },
    )
}

impl FakeEventSource {
    /// Patterns registered so far, in registration order.
    pub fn patterns(&self) -> Vec<String> {
        self.handlers.patterns().map(str::to_string).collect()
    }

    /// Deliver an occurrence immediately, without listening.
    pub fn deliver(&self, occurrence: &EventOccurrence) -> usize {
        self.handlers.dispatch(occurrence)
    }
}

impl EventSource for FakeEventSource {
    fn add_handler(&mut self, pattern: &str, handler: EventHandler) -> Result<()> {
        self.handlers.add(pattern, handler)
    }

    fn listen_for_events(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            loop {
                match self.steps.recv().await {
                    Some(SourceStep::Event(occurrence)) => {
                        self.handlers.dispatch(&occurrence);
                    }
                    Some(SourceStep::Fail(msg)) => return Err(CallbackdError::ListenerError(msg)),
                    Some(SourceStep::Finish) => return Ok(()),
                    None => std::future::pending::<()>().await,
                }
            }
        })
    }
}

impl FakeEventFeed {
    pub fn emit(&self, occurrence: EventOccurrence) {
        let _ = self.tx.send(SourceStep::Event(occurrence));
    }

    pub fn fail(&self, msg: &str) {
        let _ = self.tx.send(SourceStep::Fail(msg.to_string()));
    }

    pub fn finish(&self) {
        let _ = self.tx.send(SourceStep::Finish);
    }
}
