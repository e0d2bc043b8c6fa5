// src/events/mod.rs

//! Event sources for callbackd.
//!
//! - [`EventOccurrence`] is one notification: optional subject, event name
//!   and keyword data.
//! - [`EventSource`] is what the engine needs from a source: register a
//!   handler for an event name (or glob pattern) and run the listening loop.
//! - [`handlers`] holds the pattern → handler registry shared by sources.
//! - [`codec`] decodes the qubesd `admin.Events` stream.
//! - [`qubes`] is the production source talking to qubesd.

use std::future::Future;
use std::pin::Pin;

use serde_json::{Map, Value};

use crate::errors::Result;

pub mod codec;
pub mod handlers;
pub mod qubes;

pub use handlers::HandlerRegistry;
pub use qubes::{QubesEventSource, QubesSourceOptions, Transport};

/// Synthetic event emitted by a source every time it (re)connects.
pub const CONNECTION_ESTABLISHED: &str = "connection-established";

/// One event as delivered by the management platform.
#[derive(Debug, Clone, PartialEq)]
pub struct EventOccurrence {
    /// Affected entity (usually a VM name); `None` for global events.
    pub subject: Option<String>,
    pub name: String,
    pub kwargs: Map<String, Value>,
}

impl EventOccurrence {
    pub fn new(subject: Option<String>, name: impl Into<String>) -> Self {
        Self {
            subject,
            name: name.into(),
            kwargs: Map::new(),
        }
    }
}

/// Callback invoked for every occurrence matching its registration.
///
/// Handlers run inline on the listening task and must not block.
pub type EventHandler = Box<dyn Fn(&EventOccurrence) + Send + Sync>;

/// Trait abstracting where events come from.
///
/// Production code uses [`QubesEventSource`]; tests can provide a source
/// that replays scripted occurrences.
pub trait EventSource: Send + 'static {
    /// Register `handler` for every event whose name matches `pattern`.
    fn add_handler(&mut self, pattern: &str, handler: EventHandler) -> Result<()>;

    /// Receive and dispatch events until cancelled (by dropping the future)
    /// or until the source gives up.
    fn listen_for_events(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}
