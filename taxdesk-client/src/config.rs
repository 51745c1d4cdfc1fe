//! Client configuration.

use crate::error::ClientResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Environment variable holding the backend base URL.
pub const ENV_API_URL: &str = "TAXDESK_API_URL";
/// Environment variable holding the bearer token.
pub const ENV_ACCESS_TOKEN: &str = "TAXDESK_ACCESS_TOKEN";

/// Default backend base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Configuration for [`ChatClient`](crate::ChatClient).
///
/// There is deliberately no total request timeout: an answer may stream for
/// as long as the backend keeps the connection open. Only connecting is bounded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the backend.
    pub base_url: Url,
    /// Bearer token sent as `Authorization`.
    #[serde(skip_serializing, default)]
    pub access_token: Option<String>,
    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            access_token: None,
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

impl ClientConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `TAXDESK_API_URL` and `TAXDESK_ACCESS_TOKEN`.
    pub fn from_env() -> ClientResult<Self> {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(ENV_API_URL) {
            config.base_url = Url::parse(&url)?;
        }
        if let Ok(token) = std::env::var(ENV_ACCESS_TOKEN) {
            if !token.trim().is_empty() {
                config.access_token = Some(token);
            }
        }
        Ok(config)
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: &str) -> ClientResult<Self> {
        self.base_url = Url::parse(url)?;
        Ok(self)
    }

    /// Set the bearer token.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_seconds = timeout.as_secs().max(1);
        self
    }

    /// Connect timeout as a duration.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// URL of an API path relative to the base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
