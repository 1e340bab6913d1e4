//! Incremental decoder for `text/event-stream` bodies.
//!
//! Only the `data:` field matters for chat completions; comments
//! (`: keep-alive`) and other fields are skipped.

use crate::error::OpenAiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SseData {
    /// Payload of one event, multi-line data joined with `\n`.
    Message(String),
    /// The `[DONE]` sentinel.
    Done,
}

#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    /// Feed raw bytes, returning every event completed by them.
    ///
    /// Events may be split across chunks at arbitrary byte positions,
    /// including inside a multi-byte UTF-8 sequence.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Result<Vec<SseData>, OpenAiError> {
        self.buf.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut events = Vec::new();
        while let Some(pos) = self.buf.windows(2).position(|w| w == b"\n\n") {
            let frame: Vec<u8> = self.buf.drain(..pos + 2).collect();
            let frame = std::str::from_utf8(&frame)
                .map_err(|err| OpenAiError::Format(format!("event stream is not UTF-8: {err}")))?;

            let data: Vec<&str> = frame
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(|value| value.strip_prefix(' ').unwrap_or(value))
                .collect();
            if data.is_empty() {
                continue;
            }

            let data = data.join("\n");
            if data.trim() == "[DONE]" {
                events.push(SseData::Done);
            } else {
                events.push(SseData::Message(data));
            }
        }

        Ok(events)
    }

    /// Whether bytes of an unfinished event are still buffered.
    pub(crate) fn has_pending(&self) -> bool {
        self.buf.iter().any(|b| !b.is_ascii_whitespace())
    }
}
