// src/events/handlers.rs

//! Pattern-based handler registry.
//!
//! Event names are matched like shell globs (`domain-*`, `*`, `property-set:*`),
//! so one registration can cover a whole family of events. A literal name
//! only matches itself.

use globset::{Glob, GlobMatcher};
use tracing::trace;

use crate::errors::Result;

use super::{EventHandler, EventOccurrence};

struct Registration {
    pattern: String,
    matcher: GlobMatcher,
    handler: EventHandler,
}

/// Ordered list of `(pattern, handler)` registrations.
#[derive(Default)]
pub struct HandlerRegistry {
    registrations: Vec<Registration>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("patterns", &self.patterns().collect::<Vec<_>>())
            .finish()
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, pattern: &str, handler: EventHandler) -> Result<()> {
        let matcher = Glob::new(pattern)?.compile_matcher();
        self.registrations.push(Registration {
            pattern: pattern.to_string(),
            matcher,
            handler,
        });
        Ok(())
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.registrations.iter().map(|r| r.pattern.as_str())
    }

    /// Call every handler whose pattern matches the occurrence's name, in
    /// registration order. Returns how many handlers fired.
    pub fn dispatch(&self, occurrence: &EventOccurrence) -> usize {
        let mut fired = 0;
        for registration in &self.registrations {
            if registration.matcher.is_match(&occurrence.name) {
                (registration.handler)(occurrence);
                fired += 1;
            }
        }
        trace!(event = %occurrence.name, fired, "dispatched event to handlers");
        fired
    }
}
