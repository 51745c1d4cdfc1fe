//! Route classification tags.
//!
//! The backend classifies every question before answering it and reports the
//! reasoning path it took on the `path` field of a stream frame.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The backend reasoning path that produced an answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Route {
    /// Financial statement analysis.
    Financial,
    /// Tax incentive policy lookup in the local knowledge base.
    TaxIncentive,
    /// Answer produced by the external knowledge-base assistant.
    Coze,
    /// Raw financial data lookup.
    FinancialData,
    /// A path this client does not know about, kept verbatim.
    Other(String),
}

impl Route {
    /// Wire value of this route.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Financial => "financial",
            Self::TaxIncentive => "tax_incentive",
            Self::Coze => "coze",
            Self::FinancialData => "financial_data",
            Self::Other(path) => path,
        }
    }

    /// Badge label shown next to an assistant turn.
    #[must_use]
    pub fn badge(&self) -> Option<&'static str> {
        match self {
            Self::Financial | Self::FinancialData => Some("📊 财务数据"),
            Self::TaxIncentive => Some("📋 税收优惠"),
            Self::Coze => Some("🤖 知识库"),
            Self::Other(_) => None,
        }
    }

    /// Whether the route is one of the known backend paths.
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<&str> for Route {
    fn from(path: &str) -> Self {
        match path {
            "financial" => Self::Financial,
            "tax_incentive" => Self::TaxIncentive,
            "coze" => Self::Coze,
            "financial_data" => Self::FinancialData,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for Route {
    fn from(path: String) -> Self {
        match Self::from(path.as_str()) {
            Self::Other(_) => Self::Other(path),
            known => known,
        }
    }
}

impl From<Route> for String {
    fn from(route: Route) -> Self {
        match route {
            Route::Other(path) => path,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for Route {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("financial", Route::Financial)]
    #[case("tax_incentive", Route::TaxIncentive)]
    #[case("coze", Route::Coze)]
    #[case("financial_data", Route::FinancialData)]
    fn test_known_routes(#[case] wire: &str, #[case] expected: Route) {
        let route = Route::from(wire);
        assert_eq!(route, expected);
        assert!(route.is_known());
        assert_eq!(route.as_str(), wire);
    }

    #[test]
    fn test_unknown_route_is_preserved() {
        let route: Route = "vat_lookup".parse().unwrap();
        assert_eq!(route, Route::Other("vat_lookup".to_string()));
        assert!(!route.is_known());
        assert!(route.badge().is_none());
        assert_eq!(route.to_string(), "vat_lookup");
    }

    #[test]
    fn test_serde_as_plain_string() {
        let json = serde_json::to_string(&Route::TaxIncentive).unwrap();
        assert_eq!(json, "\"tax_incentive\"");

        let back: Route = serde_json::from_str("\"coze\"").unwrap();
        assert_eq!(back, Route::Coze);
    }

    #[test]
    fn test_badges() {
        assert_eq!(Route::Financial.badge(), Route::FinancialData.badge());
        assert_eq!(Route::Coze.badge(), Some("🤖 知识库"));
    }
}
