// src/engine/router.rs

//! Event router: binds every configured event pattern to its command.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::CommandMapping;
use crate::errors::Result;
use crate::events::{EventOccurrence, EventSource};
use crate::exec::{Invocation, TaskTracker};

/// One configured `pattern → template` pair.
///
/// Each handler owns its own `Binding`, so it always fires the template that
/// was configured for its pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub pattern: String,
    pub template: Arc<str>,
}

impl Binding {
    /// Build the invocation for one matching occurrence.
    pub fn invocation(&self, occurrence: &EventOccurrence) -> Invocation {
        Invocation::new(Arc::clone(&self.template), occurrence)
    }
}

/// All bindings described by the mapping, in key order.
pub fn bindings(mapping: &CommandMapping) -> Vec<Binding> {
    mapping
        .iter()
        .map(|(pattern, template)| Binding {
            pattern: pattern.to_string(),
            template: Arc::from(template),
        })
        .collect()
}

/// Register one handler per binding on `source`.
///
/// Every matching occurrence dispatches a fresh background execution through
/// `tracker`; repeated events are not deduplicated. Returns the number of
/// handlers registered.
pub fn configure<S>(mapping: &CommandMapping, source: &mut S, tracker: &TaskTracker) -> Result<usize>
where
    S: EventSource + ?Sized,
{
    let mut registered = 0;

    for binding in bindings(mapping) {
        let pattern = binding.pattern.clone();
        let tracker = tracker.clone();

        source.add_handler(
            &pattern,
            Box::new(move |occurrence: &EventOccurrence| {
                let id = tracker.dispatch(binding.invocation(occurrence));
                debug!(
                    task = %id,
                    pattern = %binding.pattern,
                    event = %occurrence.name,
                    "event dispatched"
                );
            }),
        )?;

        debug!(pattern = %pattern, "registered event handler");
        registered += 1;
    }

    info!(handlers = registered, "event handlers registered");
    Ok(registered)
}
