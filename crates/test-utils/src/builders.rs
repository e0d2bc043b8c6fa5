use serde_json::{Map, Value};

use callbackd::config::CommandMapping;
use callbackd::events::EventOccurrence;

/// Builder for `CommandMapping` to simplify test setup.
#[derive(Default)]
pub struct MappingBuilder {
    entries: Map<String, Value>,
}

impl MappingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, event: &str, command: &str) -> Self {
        self.entries
            .insert(event.to_string(), Value::String(command.to_string()));
        self
    }

    pub fn build(self) -> CommandMapping {
        CommandMapping::try_from(Value::Object(self.entries))
            .expect("Failed to build valid mapping from builder")
    }
}

/// Builder for `EventOccurrence`.
pub struct OccurrenceBuilder {
    occurrence: EventOccurrence,
}

impl OccurrenceBuilder {
    pub fn new(event: &str) -> Self {
        Self {
            occurrence: EventOccurrence::new(None, event),
        }
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.occurrence.subject = Some(subject.to_string());
        self
    }

    pub fn kwarg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.occurrence.kwargs.insert(key.to_string(), value.into());
        self
    }

    pub fn build(self) -> EventOccurrence {
        self.occurrence
    }
}
