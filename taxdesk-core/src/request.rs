//! Chat request body.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::TaxdeskError;

/// How verbose the assistant should be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Full answer with comparisons, charts and a summary.
    #[default]
    Detailed,
    /// Answer and summary, no charts.
    Standard,
    /// Short answer only.
    Concise,
}

impl ResponseMode {
    /// Wire value of this mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detailed => "detailed",
            Self::Standard => "standard",
            Self::Concise => "concise",
        }
    }

    /// Charts are only requested in detailed mode.
    #[must_use]
    pub fn shows_charts(&self) -> bool {
        matches!(self, Self::Detailed)
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseMode {
    type Err = TaxdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "detailed" => Ok(Self::Detailed),
            "standard" => Ok(Self::Standard),
            "concise" => Ok(Self::Concise),
            other => Err(TaxdeskError::configuration(format!(
                "unknown response mode '{}'",
                other
            ))),
        }
    }
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's question.
    pub question: String,
    /// Company the question is about.
    pub company_id: Option<i64>,
    /// Let the backend classify the question.
    pub enable_routing: bool,
    /// Ask the backend to stream chart payloads.
    pub show_chart: bool,
    /// Verbosity.
    pub response_mode: ResponseMode,
}

impl ChatRequest {
    /// Create a request. `show_chart` follows the response mode.
    pub fn new(question: impl Into<String>, company_id: Option<i64>, mode: ResponseMode) -> Self {
        Self {
            question: question.into().trim().to_string(),
            company_id,
            enable_routing: true,
            show_chart: mode.shows_charts(),
            response_mode: mode,
        }
    }

    /// Disable backend routing.
    #[must_use]
    pub fn without_routing(mut self) -> Self {
        self.enable_routing = false;
        self
    }
}
