// src/events/codec.rs

//! Decoder for the qubesd `admin.Events` stream.
//!
//! Every event is a run of NUL-terminated fields:
//!
//! ```text
//! 1\0 <subject>\0 <event>\0 (<key>\0 <value>\0)* \0
//! ```
//!
//! An empty subject means the event has none. The stream ends cleanly when
//! EOF falls exactly on an event boundary.

use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::EventOccurrence;

/// Header that starts every event chunk.
const EVENT_HEADER: &[u8] = b"1";

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("event stream ended in the middle of an event")]
    Truncated,

    #[error("non-event chunk in event stream (header {0:?})")]
    NonEventChunk(String),

    #[error("event stream field is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("IO error while reading event stream: {0}")]
    Io(#[from] std::io::Error),
}

/// Read one NUL-terminated field, without the terminator.
///
/// Returns `Ok(None)` on EOF before any byte; a field cut short by EOF is
/// `Truncated`.
async fn read_field<R>(reader: &mut R) -> Result<Option<Vec<u8>>, StreamError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let n = reader.read_until(0, &mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    if buf.pop() != Some(0) {
        return Err(StreamError::Truncated);
    }
    Ok(Some(buf))
}

async fn read_text<R>(reader: &mut R) -> Result<String, StreamError>
where
    R: AsyncBufRead + Unpin,
{
    let field = read_field(reader).await?.ok_or(StreamError::Truncated)?;
    Ok(String::from_utf8(field)?)
}

/// Read the next event from the stream.
///
/// `Ok(None)` means the stream ended cleanly.
pub async fn read_event<R>(reader: &mut R) -> Result<Option<EventOccurrence>, StreamError>
where
    R: AsyncBufRead + Unpin,
{
    let Some(header) = read_field(reader).await? else {
        return Ok(None);
    };
    if header != EVENT_HEADER {
        return Err(StreamError::NonEventChunk(
            String::from_utf8_lossy(&header).into_owned(),
        ));
    }

    let subject = read_text(reader).await?;
    let name = read_text(reader).await?;
    let mut occurrence = EventOccurrence::new(
        if subject.is_empty() { None } else { Some(subject) },
        name,
    );

    loop {
        let key = read_text(reader).await?;
        if key.is_empty() {
            break;
        }
        let value = read_text(reader).await?;
        occurrence.kwargs.insert(key, Value::String(value));
    }

    Ok(Some(occurrence))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    async fn decode_all(mut bytes: &[u8]) -> Result<Vec<EventOccurrence>, StreamError> {
        let mut events = Vec::new();
        while let Some(event) = read_event(&mut bytes).await? {
            events.push(event);
        }
        Ok(events)
    }

    #[tokio::test]
    async fn decodes_events_with_and_without_subject() {
        let stream = b"1\0work\0domain-start\0start_guid\0abc\0\01\0\0domain-add\0vm\0sys-net\0\0";
        let events = decode_all(stream).await.unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].subject.as_deref(), Some("work"));
        assert_eq!(events[0].name, "domain-start");
        assert_eq!(json!(events[0].kwargs), json!({ "start_guid": "abc" }));

        assert_eq!(events[1].subject, None);
        assert_eq!(events[1].name, "domain-add");
        assert_eq!(json!(events[1].kwargs), json!({ "vm": "sys-net" }));
    }

    #[tokio::test]
    async fn kwargs_keep_wire_order() {
        let stream = b"1\0work\0property-set:label\0name\0label\0newvalue\0red\0oldvalue\0blue\0\0";
        let events = decode_all(stream).await.unwrap();

        let keys: Vec<_> = events[0].kwargs.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "newvalue", "oldvalue"]);
    }

    #[tokio::test]
    async fn empty_stream_is_a_clean_end() {
        assert!(decode_all(b"").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_non_event_chunk() {
        let err = decode_all(b"2\0QubesException\0\0oops\0").await.unwrap_err();
        assert!(matches!(err, StreamError::NonEventChunk(ref h) if h == "2"));
    }

    #[tokio::test]
    async fn rejects_truncated_event() {
        let err = decode_all(b"1\0work\0domain-st").await.unwrap_err();
        assert!(matches!(err, StreamError::Truncated));

        let err = decode_all(b"1\0work\0domain-start\0key\0").await.unwrap_err();
        assert!(matches!(err, StreamError::Truncated));
    }
}
