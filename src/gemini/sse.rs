//! Server-sent event decoding for `streamGenerateContent?alt=sse`.

use std::collections::VecDeque;
use std::pin::Pin;

use futures::{Stream, StreamExt, stream};

use super::UnitStream;
use super::types::GenerateContentResponse;
use crate::error::GemimgError;

/// Incremental SSE parser yielding the `data` payload of each complete event.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    /// Bytes of `buffer` already known to hold no newline
    scanned: usize,
    data_lines: Vec<String>,
}

impl SseDecoder {
    /// Feeds raw bytes, returning payloads of every event completed by them.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(offset) = self.buffer[self.scanned..]
            .iter()
            .position(|byte| *byte == b'\n')
        {
            let newline = self.scanned + offset;
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            self.scanned = 0;
            self.process_line(&String::from_utf8_lossy(&line), &mut events);
        }
        self.scanned = self.buffer.len();
        events
    }

    /// Flushes whatever is buffered once the byte stream has ended.
    pub fn finish(&mut self) -> Vec<String> {
        let mut events = Vec::new();
        self.scanned = 0;
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.process_line(&String::from_utf8_lossy(&line), &mut events);
        }
        self.dispatch(&mut events);
        events
    }

    fn process_line(&mut self, line: &str, events: &mut Vec<String>) {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.is_empty() {
            self.dispatch(events);
        } else if let Some(value) = line.strip_prefix("data:") {
            self.data_lines
                .push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
        // comments (":") and the event/id/retry fields carry nothing we use
    }

    fn dispatch(&mut self, events: &mut Vec<String>) {
        if self.data_lines.is_empty() {
            return;
        }
        let payload = self.data_lines.join("\n");
        self.data_lines.clear();
        if !payload.trim().is_empty() {
            events.push(payload);
        }
    }
}

struct DecodeState<S> {
    chunks: Pin<Box<S>>,
    decoder: SseDecoder,
    ready: VecDeque<String>,
    finished: bool,
}

/// Turns a byte stream of SSE frames into decoded response units.
pub fn decode_units<S, B, E>(chunks: S) -> UnitStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Send + 'static,
    GemimgError: From<E>,
{
    let state = DecodeState {
        chunks: Box::pin(chunks),
        decoder: SseDecoder::default(),
        ready: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(payload) = state.ready.pop_front() {
                let unit = serde_json::from_str::<GenerateContentResponse>(&payload)
                    .map_err(GemimgError::Json);
                return Some((unit, state));
            }
            if state.finished {
                return None;
            }
            match state.chunks.next().await {
                Some(Ok(bytes)) => {
                    let events = state.decoder.push(bytes.as_ref());
                    state.ready.extend(events);
                }
                Some(Err(err)) => {
                    state.finished = true;
                    return Some((Err(GemimgError::from(err)), state));
                }
                None => {
                    state.finished = true;
                    let events = state.decoder.finish();
                    state.ready.extend(events);
                }
            }
        }
    })
    .boxed()
}
