//! Stream event types.
//!
//! Every decoded frame of a chat response is routed into one or more
//! [`StreamEvent`]s. Each variant corresponds to one semantic channel.

use crate::chart::ChartPayload;
use crate::route::Route;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Channel tag of a [`StreamEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamChannel {
    /// Main answer text.
    Message,
    /// Route classification.
    Route,
    /// Chart payload.
    Chart,
    /// Analysis summary text, drawn after the charts.
    Summary,
    /// Stream completed.
    Done,
    /// Server-signalled or transport error.
    Error,
}

/// An event of a chat response stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Text delta for the main answer. May be empty.
    Message {
        /// The text fragment.
        content: String,
    },

    /// The backend chose a reasoning path.
    Route {
        /// Route tag.
        route: Route,
        /// Company the question was resolved to, if any.
        company: Option<String>,
    },

    /// A chart to draw under the answer.
    Chart {
        /// Chart description, verbatim.
        payload: ChartPayload,
    },

    /// Text delta for the analysis summary.
    Summary {
        /// The text fragment.
        content: String,
    },

    /// The stream completed.
    Done,

    /// An error ended the stream.
    Error {
        /// Human-readable message.
        message: String,
    },
}

impl StreamEvent {
    /// Create a message delta.
    pub fn message(content: impl Into<String>) -> Self {
        Self::Message {
            content: content.into(),
        }
    }

    /// Create a route event.
    pub fn route(route: impl Into<Route>, company: Option<String>) -> Self {
        Self::Route {
            route: route.into(),
            company,
        }
    }

    /// Create a chart event.
    pub fn chart(payload: impl Into<ChartPayload>) -> Self {
        Self::Chart {
            payload: payload.into(),
        }
    }

    /// Create a summary delta.
    pub fn summary(content: impl Into<String>) -> Self {
        Self::Summary {
            content: content.into(),
        }
    }

    /// Create an error event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Channel this event belongs to.
    #[must_use]
    pub fn channel(&self) -> StreamChannel {
        match self {
            Self::Message { .. } => StreamChannel::Message,
            Self::Route { .. } => StreamChannel::Route,
            Self::Chart { .. } => StreamChannel::Chart,
            Self::Summary { .. } => StreamChannel::Summary,
            Self::Done => StreamChannel::Done,
            Self::Error { .. } => StreamChannel::Error,
        }
    }

    /// Check if this event finishes the stream.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }

    /// Get the text if this is a message delta.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Message { content } => Some(content),
            _ => None,
        }
    }
}

impl fmt::Display for StreamEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message { content } => write!(f, "{}", content),
            Self::Route { route, company } => match company {
                Some(company) => write!(f, "[route] {} ({})", route, company),
                None => write!(f, "[route] {}", route),
            },
            Self::Chart { payload } => {
                write!(f, "[chart] {}", payload.title().unwrap_or("untitled"))
            }
            Self::Summary { content } => write!(f, "[summary] {}", content),
            Self::Done => write!(f, "[done]"),
            Self::Error { message } => write!(f, "[error] {}", message),
        }
    }
}
