//! Client error types.

use taxdesk_streaming::StreamError;
use thiserror::Error;

/// Errors raised while talking to the chat backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Non-success HTTP status.
    #[error("HTTP error: {status} - {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The request never reached the server or the connection dropped.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Malformed base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Decoding the response body failed.
    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl ClientError {
    /// Create an HTTP error.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Message handed to the `on_error` handler.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http { status, .. } => format!("API 错误: {}", status),
            Self::Connection(message) => message.clone(),
            Self::Stream(StreamError::Transport(message)) => message.clone(),
            other => other.to_string(),
        }
    }

    /// HTTP status, if this is an HTTP error.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::http(status.as_u16(), err.to_string()),
            None => Self::Connection(err.to_string()),
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
