//! Server-Sent Events (SSE) frame decoding.
//!
//! The chat endpoint streams newline-delimited `event:` / `data:` lines. The
//! decoder turns arbitrarily chunked bytes into `(event name, JSON)` frames:
//!
//! - bytes are decoded as UTF-8 incrementally, so a character split across two
//!   chunks is reassembled rather than corrupted;
//! - only complete lines are processed, the trailing fragment waits for the
//!   next chunk;
//! - `data:` lines that are not valid JSON are dropped without error;
//! - whatever is still buffered when the stream ends is discarded.

use crate::error::{StreamError, StreamResult};
use bytes::Bytes;
use futures::Stream;
use pin_project_lite::pin_project;
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

const EVENT_PREFIX: &str = "event: ";
const DATA_PREFIX: &str = "data: ";

/// Default limit for a single unterminated line.
pub const MAX_BUFFER_SIZE: usize = 10 * 1024 * 1024;

/// A decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SseFrame {
    /// Event name; empty for the default channel.
    pub event: String,
    /// Parsed `data:` payload.
    pub data: JsonValue,
}

impl SseFrame {
    /// Frame on the default channel.
    pub fn data(data: JsonValue) -> Self {
        Self {
            event: String::new(),
            data,
        }
    }

    /// Set the event name.
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = event.into();
        self
    }

    /// Check the event name.
    #[must_use]
    pub fn is_event(&self, name: &str) -> bool {
        self.event == name
    }

    /// Encode this frame in wire format, terminated by a blank line.
    #[must_use]
    pub fn encode(&self) -> String {
        let event = (!self.event.is_empty()).then_some(self.event.as_str());
        encode_frame(event, &self.data)
    }
}

/// Encode an `event:`/`data:` pair the way the chat endpoint does.
#[must_use]
pub fn encode_frame(event: Option<&str>, data: &JsonValue) -> String {
    match event {
        Some(event) => format!("{}{}\n{}{}\n\n", EVENT_PREFIX, event, DATA_PREFIX, data),
        None => format!("{}{}\n\n", DATA_PREFIX, data),
    }
}

/// Incremental SSE decoder.
///
/// One decoder serves exactly one response body.
#[derive(Debug)]
pub struct SseDecoder {
    pending_bytes: Vec<u8>,
    buffer: String,
    current_event: String,
    max_buffer: usize,
    deferred: Option<StreamError>,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SseDecoder {
    /// Create a new decoder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending_bytes: Vec::new(),
            buffer: String::new(),
            current_event: String::new(),
            max_buffer: MAX_BUFFER_SIZE,
            deferred: None,
        }
    }

    /// Set the limit for a single unterminated line.
    #[must_use]
    pub fn with_max_buffer(mut self, limit: usize) -> Self {
        self.max_buffer = limit;
        self
    }

    /// Feed a chunk of bytes; returns the frames completed by it.
    ///
    /// If the chunk completes frames and also overflows the line limit, the
    /// frames are returned and the overflow is held back: it is available
    /// from [`take_error`](Self::take_error) and returned by the next `feed`.
    pub fn feed(&mut self, chunk: &[u8]) -> StreamResult<Vec<SseFrame>> {
        if let Some(error) = self.deferred.take() {
            return Err(error);
        }
        self.decode(chunk);
        self.drain_lines()
    }

    /// Feed a string.
    pub fn feed_str(&mut self, s: &str) -> StreamResult<Vec<SseFrame>> {
        self.feed(s.as_bytes())
    }

    /// Take an error held back by the last [`feed`](Self::feed).
    pub fn take_error(&mut self) -> Option<StreamError> {
        self.deferred.take()
    }

    /// Current event name register.
    #[must_use]
    pub fn current_event(&self) -> &str {
        &self.current_event
    }

    /// Number of bytes waiting for a line break or for the rest of a character.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len() + self.pending_bytes.len()
    }

    /// End of stream. Anything still buffered is discarded, not parsed.
    ///
    /// Returns the number of discarded bytes.
    pub fn finish(&mut self) -> usize {
        let discarded = self.buffered_len();
        if discarded > 0 {
            tracing::trace!(bytes = discarded, "discarding unterminated SSE data at end of stream");
        }
        self.buffer.clear();
        self.pending_bytes.clear();
        discarded
    }

    fn decode(&mut self, chunk: &[u8]) {
        self.pending_bytes.extend_from_slice(chunk);

        let mut start = 0;
        while start < self.pending_bytes.len() {
            match std::str::from_utf8(&self.pending_bytes[start..]) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    start = self.pending_bytes.len();
                }
                Err(e) => {
                    let valid_end = start + e.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&self.pending_bytes[start..valid_end]) {
                        self.buffer.push_str(text);
                    }
                    match e.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + len;
                        }
                        // incomplete character at the end, wait for the next chunk
                        None => {
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.pending_bytes.drain(..start);
    }

    fn drain_lines(&mut self) -> StreamResult<Vec<SseFrame>> {
        let mut frames = Vec::new();

        if let Some(last_newline) = self.buffer.rfind('\n') {
            let rest = self.buffer.split_off(last_newline + 1);
            let complete = std::mem::replace(&mut self.buffer, rest);

            for line in complete[..complete.len() - 1].split('\n') {
                if let Some(frame) = self.process_line(line) {
                    frames.push(frame);
                }
            }
        }

        if self.buffer.len() > self.max_buffer {
            self.buffer.clear();
            let error = StreamError::BufferOverflow {
                limit: self.max_buffer,
            };
            if frames.is_empty() {
                return Err(error);
            }
            self.deferred = Some(error);
        }

        Ok(frames)
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if let Some(name) = line.strip_prefix(EVENT_PREFIX) {
            self.current_event = name.trim().to_string();
            return None;
        }

        if let Some(raw) = line.strip_prefix(DATA_PREFIX) {
            return match serde_json::from_str::<JsonValue>(raw) {
                Ok(data) => Some(SseFrame {
                    event: self.current_event.clone(),
                    data,
                }),
                Err(e) => {
                    tracing::trace!(error = %e, "dropping malformed SSE data line");
                    None
                }
            };
        }

        // a blank line closes the frame, the next one starts on the default channel
        if line.trim().is_empty() {
            self.current_event.clear();
        }

        None
    }
}

pin_project! {
    /// Stream adapter that decodes SSE frames from a byte stream.
    pub struct SseFrameStream<S> {
        #[pin]
        inner: S,
        decoder: SseDecoder,
        pending: VecDeque<SseFrame>,
        error: Option<StreamError>,
        finished: bool,
    }
}

impl<S> SseFrameStream<S> {
    /// Create a new frame stream from a byte stream.
    pub fn new(inner: S) -> Self {
        Self::with_decoder(inner, SseDecoder::new())
    }

    /// Create a new frame stream with a configured decoder.
    pub fn with_decoder(inner: S, decoder: SseDecoder) -> Self {
        Self {
            inner,
            decoder,
            pending: VecDeque::new(),
            error: None,
            finished: false,
        }
    }
}

impl<S, E> Stream for SseFrameStream<S>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    type Item = StreamResult<SseFrame>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(frame) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(frame)));
            }

            if let Some(error) = this.error.take() {
                *this.finished = true;
                return Poll::Ready(Some(Err(error)));
            }

            if *this.finished {
                return Poll::Ready(None);
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => match this.decoder.feed(&bytes) {
                    Ok(frames) => {
                        this.pending.extend(frames);
                        *this.error = this.decoder.take_error();
                    }
                    Err(error) => {
                        *this.finished = true;
                        return Poll::Ready(Some(Err(error)));
                    }
                },
                Poll::Ready(Some(Err(e))) => {
                    *this.finished = true;
                    return Poll::Ready(Some(Err(StreamError::transport(e))));
                }
                Poll::Ready(None) => {
                    *this.finished = true;
                    this.decoder.finish();
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
