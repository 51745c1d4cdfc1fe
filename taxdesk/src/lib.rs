//! # taxdesk
//!
//! Streaming chat client for a financial and tax analysis backend.
//!
//! A question goes to `POST /api/chat`; the answer comes back as server-sent
//! events carrying text deltas, a route decision, chart payloads, a summary
//! and a completion or error signal. This crate decodes that stream, routes
//! each frame to the right channel and folds the result into a conversation
//! transcript that can be exported as markdown.
//!
//! ## Quick Start
//!
//! ```ignore
//! use taxdesk::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ChatClient::from_env()?;
//!     let acc = ConversationAccumulator::new();
//!     acc.submit("2023年增值税税负率");
//!
//!     let handle = client.stream_chat("2023年增值税税负率", None, ResponseMode::Detailed, acc.handlers());
//!     handle.join().await;
//!     println!("{}", acc.snapshot().to_markdown());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! | Crate | Contents |
//! |-------|----------|
//! | [`core`] | events, routes, charts, requests, conversation and history |
//! | [`streaming`] | SSE decoder, frame router, handlers, accumulator |
//! | [`client`] | HTTP transport, configuration, cancellation |

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use taxdesk_client as client;
pub use taxdesk_core as core;
pub use taxdesk_streaming as streaming;

pub use taxdesk_client::{
    AbortHandle, ChatClient, ClientConfig, ClientError, ClientResult, StreamHandle, StreamOutcome,
};
pub use taxdesk_core::{
    ChartPayload, ChartSpec, ChatRequest, Conversation, ConversationTurn, HistoryNavigator,
    QuestionHistory, ResponseMode, Route, StreamEvent, TaxdeskError,
};
pub use taxdesk_streaming::{
    event_stream, route_frame, ConversationAccumulator, SseDecoder, SseFrame, StreamError,
    StreamHandlers,
};

/// Prelude for common imports.
pub mod prelude {
    pub use taxdesk_client::{
        AbortHandle, ChatClient, ClientConfig, ClientError, StreamHandle, StreamOutcome,
    };
    pub use taxdesk_core::{
        ChartPayload, ChatRequest, Conversation, ConversationTurn, QuestionHistory, ResponseMode,
        Route, StreamEvent,
    };
    pub use taxdesk_streaming::{ConversationAccumulator, StreamHandlers};
}
