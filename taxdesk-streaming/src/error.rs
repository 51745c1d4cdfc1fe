//! Streaming errors.

use thiserror::Error;

/// Errors that can occur while decoding a chat stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The underlying byte stream failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A single line grew past the decoder's buffer limit.
    #[error("SSE buffer exceeded {limit} bytes without a line break")]
    BufferOverflow {
        /// The limit that was exceeded.
        limit: usize,
    },
}

impl StreamError {
    /// Check if the error is recoverable by simply retrying the request.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Create a transport error from any displayable error.
    pub fn transport<E: std::fmt::Display>(err: E) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Result type for streaming operations.
pub type StreamResult<T> = Result<T, StreamError>;
