// src/config/model.rs

use std::collections::BTreeMap;

/// File name of the configuration, looked up next to the executable.
pub const CONFIG_FILE_NAME: &str = "callbackd.json";

/// Validated event → command mapping.
///
/// Read from a JSON object such as:
///
/// ```json
/// {
///   "domain-start": "/usr/local/bin/on-start --verbose",
///   "domain-shutdown": "logger -t callbackd # subject, event and kwargs appended"
/// }
/// ```
///
/// Keys are event names; they may also be glob patterns (`domain-*`, `*`).
/// Values are shell-style command lines. The mapping is built once at
/// startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMapping {
    entries: BTreeMap<String, String>,
}

impl CommandMapping {
    /// Construct without validation. Use `CommandMapping::try_from` on a
    /// decoded JSON value (or [`crate::config::load_and_validate`]) instead.
    pub(crate) fn new_unchecked(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Command template configured for exactly this key, if any.
    pub fn get(&self, event: &str) -> Option<&str> {
        self.entries.get(event).map(String::as_str)
    }

    /// Iterate `(event pattern, command template)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(event, command)| (event.as_str(), command.as_str()))
    }
}
