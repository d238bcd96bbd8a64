use bytes::Bytes;
use color_eyre::Result;
use serde::Deserialize;

use super::{ChatCompletionChunk, ENDPOINT};
use crate::{
    PipelineError,
    open_ai::{ErrorEnvelope, OpenAIApiError},
};

#[derive(Debug)]
pub struct RawEvent {
    /// Value from `event:`, OpenAI normally leaves it out
    pub event_type: Option<String>,

    /// Concatenated `data:` payload (may contain newlines)
    pub data: String,
}

#[derive(Debug)]
pub enum Event {
    Chunk(ChatCompletionChunk),
    Done,
    Error(OpenAIApiError),
    Unknown(RawEvent),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Chunk(ChatCompletionChunk),
    Error(ErrorEnvelope),
}

/// Blank lines end an event. Servers may use any of the three line endings.
const EVENT_DELIMITERS: [&[u8]; 3] = [b"\r\n\r\n", b"\n\n", b"\r\r"];

#[derive(Default)]
pub struct Parser {
    bytes: Vec<u8>,
    index: usize,
}

impl Parser {
    /// Feed a chunk into the parser, returning all complete events
    pub fn process(&mut self, chunk: Bytes) -> Result<Vec<Event>> {
        self.bytes.extend_from_slice(&chunk);
        let mut events = vec![];

        while let Some((pos, delimiter_len)) = find_event_end(&self.bytes[self.index..]) {
            let event_bytes = &self.bytes[self.index..self.index + pos];
            if let Some(event) = parse_sse_event(event_bytes)? {
                events.push(Event::from_raw_event(event));
            }
            self.index += pos + delimiter_len;
        }

        // everything before index is consumed
        if self.index == self.bytes.len() {
            self.bytes.clear();
            self.index = 0;
        }

        Ok(events)
    }

    /// Parses what is left in the buffer once the stream has ended, for
    /// servers that don't finish the last event with a blank line.
    pub fn parse_remaining(&mut self) -> Result<Option<Event>> {
        let remaining = &self.bytes[self.index..];
        let event = parse_sse_event(remaining)?;
        self.bytes.clear();
        self.index = 0;
        Ok(event.map(Event::from_raw_event))
    }
}

/// Position and length of the first event delimiter in `buf`.
fn find_event_end(buf: &[u8]) -> Option<(usize, usize)> {
    (0..buf.len()).find_map(|i| {
        EVENT_DELIMITERS
            .iter()
            .find(|delimiter| buf[i..].starts_with(delimiter))
            .map(|delimiter| (i, delimiter.len()))
    })
}

/// Returns `None` for blocks that only hold comments (keep-alives).
fn parse_sse_event(buf: &[u8]) -> Result<Option<RawEvent>> {
    let text = std::str::from_utf8(buf)
        .map_err(|e| PipelineError::malformed(ENDPOINT, format!("event is not UTF-8: {e}")))?;
    let mut event_type = None;
    let mut data: Option<String> = None;

    for line in text.split(['\r', '\n']) {
        if line.is_empty() || line.starts_with(':') {
            continue;
        } else if let Some(value) = field_value(line, "event") {
            event_type = Some(value.to_string());
        } else if let Some(value) = field_value(line, "data") {
            let data = data.get_or_insert_with(String::new);
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(value);
        } else if field_value(line, "id").is_some() || field_value(line, "retry").is_some() {
            // reconnection hints, a single request never resumes
        } else {
            return Err(PipelineError::malformed(
                ENDPOINT,
                format!("unexpected line in event stream: {line}"),
            )
            .into());
        }
    }

    Ok(data.map(|data| RawEvent { event_type, data }))
}

fn field_value<'a>(line: &'a str, field: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(field)?.strip_prefix(':')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

impl Event {
    pub fn from_raw_event(raw: RawEvent) -> Self {
        if raw.data.trim() == "[DONE]" {
            return Event::Done;
        }

        if raw.event_type.as_deref() == Some("error") {
            return match serde_json::from_str::<ErrorEnvelope>(&raw.data) {
                Ok(envelope) => Event::Error(envelope.error.into()),
                Err(_) => Event::Error(OpenAIApiError::Unexpected {
                    error_type: "error event".into(),
                    message: raw.data,
                }),
            };
        }

        match serde_json::from_str::<Payload>(&raw.data) {
            Ok(Payload::Chunk(chunk)) => Event::Chunk(chunk),
            Ok(Payload::Error(envelope)) => Event::Error(envelope.error.into()),
            Err(_) => Event::Unknown(raw),
        }
    }
}
