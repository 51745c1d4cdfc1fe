//! # taxdesk-streaming
//!
//! Streaming support for the taxdesk chat client.
//!
//! This crate turns the raw byte stream of a chat answer into typed events and
//! folds those events into a conversation.
//!
//! ## Core Concepts
//!
//! - **[`SseDecoder`]**: incremental, UTF-8 safe line decoder producing [`SseFrame`]s
//! - **[`route_frame`]**: classifies a frame into one or more [`StreamEvent`]s
//! - **[`EventStream`]**: stream adapter combining both over a byte stream
//! - **[`StreamHandlers`]**: optional per-channel callbacks
//! - **[`ConversationAccumulator`]**: shared transcript fed by handlers
//!
//! ## Example
//!
//! ```rust
//! use taxdesk_streaming::{route_frame, ConversationAccumulator, SseDecoder};
//!
//! let acc = ConversationAccumulator::new();
//! acc.submit("增值税税负率");
//! let mut handlers = acc.handlers();
//!
//! let mut decoder = SseDecoder::new();
//! for chunk in ["data: {\"content\":\"税负", "率 3%\"}\n\n", "data: {\"status\":\"completed\"}\n"] {
//!     for frame in decoder.feed_str(chunk).unwrap() {
//!         for event in route_frame(&frame) {
//!             handlers.dispatch(&event);
//!         }
//!     }
//! }
//!
//! let conversation = acc.snapshot();
//! assert_eq!(conversation.turns()[1].as_assistant().unwrap().content, "税负率 3%");
//! assert!(!conversation.is_streaming());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod accumulator;
pub mod error;
pub mod handlers;
pub mod router;
pub mod sse;

use bytes::Bytes;
use futures::Stream;

// Re-exports
pub use accumulator::ConversationAccumulator;
pub use error::{StreamError, StreamResult};
pub use handlers::StreamHandlers;
pub use router::{route_frame, EventStream};
pub use sse::{encode_frame, SseDecoder, SseFrame, SseFrameStream, MAX_BUFFER_SIZE};
pub use taxdesk_core::StreamEvent;

/// Decode and route a response body into stream events.
pub fn event_stream<S, E>(body: S) -> EventStream<SseFrameStream<S>>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    EventStream::new(SseFrameStream::new(body))
}

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        event_stream, route_frame, ConversationAccumulator, EventStream, SseDecoder, SseFrame,
        StreamError, StreamEvent, StreamHandlers, StreamResult,
    };
}
