//! Error types for taxdesk.

use thiserror::Error;

/// The main error type for taxdesk model operations.
#[derive(Error, Debug)]
pub enum TaxdeskError {
    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error while loading or saving persisted state.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl TaxdeskError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

/// Result type alias using TaxdeskError.
pub type Result<T> = std::result::Result<T, TaxdeskError>;
