// src/config/validate.rs

use std::collections::BTreeMap;

use serde_json::Value;

use crate::config::model::CommandMapping;
use crate::errors::{CallbackdError, Result};

impl TryFrom<Value> for CommandMapping {
    type Error = crate::errors::CallbackdError;

    /// Templates are kept as written. One that does not tokenize is reported
    /// each time its event fires, so it cannot take the other entries down.
    fn try_from(raw: Value) -> std::result::Result<Self, Self::Error> {
        let mut entries = BTreeMap::new();
        for (event, command) in ensure_object(raw)? {
            let command = validate_command(&event, command)?;
            entries.insert(event, command);
        }

        let mapping = CommandMapping::new_unchecked(entries);
        if mapping.is_empty() {
            return Err(CallbackdError::ConfigError(
                "the configuration needs to define at least one [event] --> [command] entry"
                    .to_string(),
            ));
        }
        Ok(mapping)
    }
}

fn ensure_object(raw: Value) -> Result<serde_json::Map<String, Value>> {
    match raw {
        Value::Object(object) => Ok(object),
        other => Err(CallbackdError::ConfigError(format!(
            "the configuration needs to be an object of [event] --> [command], got {}",
            json_kind(&other)
        ))),
    }
}

fn validate_command(event: &str, command: Value) -> Result<String> {
    if event.trim().is_empty() {
        return Err(CallbackdError::ConfigError(
            "event names must not be empty".to_string(),
        ));
    }

    let Value::String(command) = command else {
        return Err(CallbackdError::ConfigError(format!(
            "command for event '{event}' must be a string, got {}",
            json_kind(&command)
        )));
    };

    Ok(command)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn config_error(raw: Value) -> String {
        match CommandMapping::try_from(raw) {
            Err(CallbackdError::ConfigError(msg)) => msg,
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn accepts_object_of_commands() {
        let mapping = CommandMapping::try_from(json!({
            "domain-start": "echo started",
            "domain-shutdown": "logger -t vm # trailing comment",
        }))
        .unwrap();

        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.get("domain-start"), Some("echo started"));
        assert_eq!(
            mapping.get("domain-shutdown"),
            Some("logger -t vm # trailing comment")
        );
    }

    #[test]
    fn rejects_list() {
        let msg = config_error(json!(["domain-start", "echo started"]));
        assert!(msg.contains("object"));
        assert!(msg.contains("a list"));
    }

    #[test]
    fn rejects_empty_object() {
        let msg = config_error(json!({}));
        assert!(msg.contains("at least one"));
    }

    #[test]
    fn rejects_non_string_command() {
        let msg = config_error(json!({ "domain-start": ["echo", "started"] }));
        assert!(msg.contains("domain-start"));
        assert!(msg.contains("must be a string"));
    }

    #[test]
    fn keeps_untokenizable_commands_next_to_valid_ones() {
        let mapping = CommandMapping::try_from(json!({
            "domain-start": "true",
            "domain-shutdown": "echo 'oops",
            "domain-paused": "# nothing here",
        }))
        .unwrap();

        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.get("domain-start"), Some("true"));
        assert_eq!(mapping.get("domain-shutdown"), Some("echo 'oops"));
    }
}
