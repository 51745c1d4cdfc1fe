//! # taxdesk-core
//!
//! Core types for the taxdesk chat client.
//!
//! - **Events**: the typed channels of a streamed chat answer
//! - **Charts**: verbatim chart payloads with a typed view
//! - **Conversation**: the transcript and the reducer that folds events into it
//! - **History**: recently asked questions
//! - **Errors**: the crate error type
//!
//! ## Example
//!
//! ```rust
//! use taxdesk_core::{Conversation, Route, StreamEvent};
//!
//! let mut conversation = Conversation::new();
//! conversation.submit("2024年营业收入是多少？");
//!
//! conversation.apply(&StreamEvent::route("financial", None));
//! conversation.apply(&StreamEvent::message("营业收入为"));
//! conversation.apply(&StreamEvent::message(" 1200 万元"));
//! conversation.apply(&StreamEvent::Done);
//!
//! let answer = conversation.turns()[1].as_assistant().unwrap();
//! assert_eq!(answer.content, "营业收入为 1200 万元");
//! assert_eq!(answer.route, Some(Route::Financial));
//! assert!(!conversation.is_streaming());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod chart;
pub mod conversation;
pub mod errors;
pub mod event;
pub mod history;
pub mod request;
pub mod route;

pub use chart::{ChartDataset, ChartKind, ChartPayload, ChartSpec};
pub use conversation::{
    error_annotation, reduce, AssistantTurn, Conversation, ConversationTurn, HistoryNavigator,
    UserTurn, ERROR_ANNOTATION_PREFIX,
};
pub use errors::{Result, TaxdeskError};
pub use event::{StreamChannel, StreamEvent};
pub use history::{QuestionHistory, DEFAULT_HISTORY_CAPACITY};
pub use request::{ChatRequest, ResponseMode};
pub use route::Route;
