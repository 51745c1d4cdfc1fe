//! Frame classification.
//!
//! Maps each decoded [`SseFrame`] onto the semantic channels of a chat answer.
//! The mapping is not one-to-one: a single frame can carry, say, both a text
//! delta and a route update, and both are emitted.

use crate::error::StreamResult;
use crate::sse::SseFrame;
use futures::Stream;
use pin_project_lite::pin_project;
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use taxdesk_core::{ChartPayload, Route, StreamEvent};

const STATUS_COMPLETED: &str = "completed";

/// Classify a frame into zero or more stream events, in dispatch order.
///
/// 1. a `chart` frame yields a chart event carrying the payload verbatim;
///    otherwise a `summary` frame yields a summary delta from `content`;
///    otherwise a present `content` field (even empty) yields a message delta;
/// 2. a present `path` field also yields a route event with `company`;
/// 3. `status == "completed"` also yields `done`;
/// 4. an `error` frame with a `message` field also yields an error event.
#[must_use]
pub fn route_frame(frame: &SseFrame) -> Vec<StreamEvent> {
    let data = &frame.data;
    let mut events = Vec::new();

    if frame.is_event("chart") {
        events.push(StreamEvent::Chart {
            payload: ChartPayload::new(data.clone()),
        });
    } else if frame.is_event("summary") {
        events.push(StreamEvent::summary(
            field_text(data, "content").unwrap_or_default(),
        ));
    } else if let Some(content) = field_text(data, "content") {
        events.push(StreamEvent::message(content));
    }

    if let Some(path) = field_text(data, "path") {
        let company = field_text(data, "company");
        events.push(StreamEvent::route(Route::from(path), company));
    }

    if data.get("status").and_then(JsonValue::as_str) == Some(STATUS_COMPLETED) {
        events.push(StreamEvent::Done);
    }

    if frame.is_event("error") {
        if let Some(message) = field_text(data, "message") {
            events.push(StreamEvent::error(message));
        }
    }

    events
}

/// Text of a present field. Strings are taken as is, `null` reads as absent
/// and other values are rendered as JSON.
fn field_text(data: &JsonValue, key: &str) -> Option<String> {
    match data.get(key)? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Null => None,
        other => Some(other.to_string()),
    }
}

pin_project! {
    /// Stream adapter that routes decoded frames into stream events.
    pub struct EventStream<S> {
        #[pin]
        inner: S,
        pending: VecDeque<StreamEvent>,
    }
}

impl<S> EventStream<S> {
    /// Create a new event stream over a frame stream.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            pending: VecDeque::new(),
        }
    }
}

impl<S> Stream for EventStream<S>
where
    S: Stream<Item = StreamResult<SseFrame>>,
{
    type Item = StreamResult<StreamEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(event) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(frame))) => this.pending.extend(route_frame(&frame)),
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
