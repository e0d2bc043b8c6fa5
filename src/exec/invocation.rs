// src/exec/invocation.rs

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::events::EventOccurrence;

/// Argument passed in place of the subject when an event has none.
pub const NO_SUBJECT: &str = "None";

/// Why a command template could not be turned into an argument vector.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("unbalanced quoting or trailing escape in command")]
    Malformed,

    #[error("command is empty once comments are stripped")]
    Empty,
}

/// Split a command template into words using POSIX shell rules.
///
/// A `#` at the start of a word starts a comment that runs to the end of
/// the line.
pub fn tokenize(template: &str) -> Result<Vec<String>, TokenizeError> {
    let words = shlex::split(template).ok_or(TokenizeError::Malformed)?;
    if words.is_empty() {
        return Err(TokenizeError::Empty);
    }
    Ok(words)
}

/// One execution of a command template in response to one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub template: Arc<str>,
    pub subject: Option<String>,
    pub event: String,
    pub kwargs: Map<String, Value>,
}

impl Invocation {
    pub fn new(template: Arc<str>, occurrence: &EventOccurrence) -> Self {
        Self {
            template,
            subject: occurrence.subject.clone(),
            event: occurrence.name.clone(),
            kwargs: occurrence.kwargs.clone(),
        }
    }

    /// Full argument vector: the tokenized template followed by
    /// `<subject|None> <event> <kwargs as compact JSON>`.
    pub fn argv(&self) -> anyhow::Result<Vec<String>> {
        let mut argv = tokenize(&self.template)?;
        argv.push(
            self.subject
                .clone()
                .unwrap_or_else(|| NO_SUBJECT.to_string()),
        );
        argv.push(self.event.clone());
        argv.push(serde_json::to_string(&self.kwargs)?);
        Ok(argv)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn invocation(template: &str, subject: Option<&str>, kwargs: Value) -> Invocation {
        let Value::Object(kwargs) = kwargs else {
            panic!("kwargs must be an object");
        };
        Invocation {
            template: Arc::from(template),
            subject: subject.map(str::to_string),
            event: "domain-start".to_string(),
            kwargs,
        }
    }

    #[test]
    fn tokenize_strips_trailing_comment() {
        assert_eq!(
            tokenize("notify-send 'VM event' # tell the desktop").unwrap(),
            vec!["notify-send", "VM event"]
        );
    }

    #[test]
    fn tokenize_keeps_hash_inside_a_word() {
        assert_eq!(tokenize("echo a#b").unwrap(), vec!["echo", "a#b"]);
    }

    #[test]
    fn tokenize_rejects_unbalanced_quotes() {
        assert_eq!(tokenize("echo \"oops"), Err(TokenizeError::Malformed));
    }

    #[test]
    fn tokenize_rejects_comment_only() {
        assert_eq!(tokenize("   # just a note"), Err(TokenizeError::Empty));
        assert_eq!(tokenize(""), Err(TokenizeError::Empty));
    }

    #[test]
    fn argv_appends_subject_event_and_json() {
        let inv = invocation(
            "/usr/bin/handler --flag # comment",
            Some("work"),
            json!({ "start_guid": "abc" }),
        );

        assert_eq!(
            inv.argv().unwrap(),
            vec![
                "/usr/bin/handler",
                "--flag",
                "work",
                "domain-start",
                r#"{"start_guid":"abc"}"#,
            ]
        );
    }

    #[test]
    fn kwargs_json_keeps_insertion_order() {
        let mut kwargs = Map::new();
        kwargs.insert("name".to_string(), json!("label"));
        kwargs.insert("newvalue".to_string(), json!("red"));
        kwargs.insert("oldvalue".to_string(), json!("blue"));
        kwargs.insert("key".to_string(), json!("label"));
        let inv = Invocation {
            template: Arc::from("true"),
            subject: Some("work".to_string()),
            event: "property-set:label".to_string(),
            kwargs,
        };

        assert_eq!(
            inv.argv().unwrap().last().map(String::as_str),
            Some(r#"{"name":"label","newvalue":"red","oldvalue":"blue","key":"label"}"#)
        );
    }

    #[test]
    fn argv_uses_placeholder_without_subject() {
        let inv = invocation("true", None, json!({}));
        assert_eq!(inv.argv().unwrap(), vec!["true", "None", "domain-start", "{}"]);
    }

    #[test]
    fn argv_reports_malformed_template() {
        let inv = invocation("echo 'half", None, json!({}));
        let err = inv.argv().unwrap_err();
        assert!(err.to_string().contains("unbalanced"));
    }
}
