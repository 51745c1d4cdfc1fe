//! Chart payloads streamed on the `chart` channel.
//!
//! The payload is kept exactly as the server sent it. [`ChartSpec`] is a typed,
//! read-only view over the fields the dashboard actually draws.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::fmt::Write as _;

/// A chart description, kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartPayload(JsonValue);

impl ChartPayload {
    /// Wrap a raw JSON payload.
    #[must_use]
    pub fn new(value: JsonValue) -> Self {
        Self(value)
    }

    /// The raw payload.
    #[must_use]
    pub fn as_value(&self) -> &JsonValue {
        &self.0
    }

    /// Consume and return the raw payload.
    #[must_use]
    pub fn into_value(self) -> JsonValue {
        self.0
    }

    /// Chart title, if the payload has one.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.0.get("title").and_then(JsonValue::as_str)
    }

    /// Typed view of the payload.
    ///
    /// Returns `None` unless both `labels` and `datasets` are present and
    /// well-formed; such payloads cannot be drawn.
    #[must_use]
    pub fn spec(&self) -> Option<ChartSpec> {
        if self.0.get("labels").is_none() || self.0.get("datasets").is_none() {
            return None;
        }
        ChartSpec::deserialize(&self.0).ok()
    }
}

impl From<JsonValue> for ChartPayload {
    fn from(value: JsonValue) -> Self {
        Self(value)
    }
}

/// Kind of chart to draw.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChartKind {
    /// Bar chart.
    #[default]
    Bar,
    /// Line chart.
    Line,
    /// Bars and lines sharing the category axis.
    Combo,
    /// Anything else, kept verbatim.
    Other(String),
}

impl From<String> for ChartKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "bar" => Self::Bar,
            "line" => Self::Line,
            "combo" => Self::Combo,
            _ => Self::Other(kind),
        }
    }
}

impl From<ChartKind> for String {
    fn from(kind: ChartKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bar => f.write_str("bar"),
            Self::Line => f.write_str("line"),
            Self::Combo => f.write_str("combo"),
            Self::Other(kind) => f.write_str(kind),
        }
    }
}

/// Typed chart description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    /// Chart kind, `bar` when absent.
    #[serde(default)]
    pub chart_type: ChartKind,
    /// Chart title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Ordered category labels.
    pub labels: Vec<String>,
    /// Named numeric series.
    pub datasets: Vec<ChartDataset>,
    /// Rendering hints (axes, growth annotations).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<JsonValue>,
}

/// One numeric series of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    /// Series name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Per-series kind in combo charts.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ChartKind>,
    /// Values, one per label; `null` marks a gap.
    pub data: Vec<Option<f64>>,
    /// Axis this series is plotted against.
    #[serde(default, rename = "yAxisID", skip_serializing_if = "Option::is_none")]
    pub y_axis_id: Option<String>,
    /// Colors and other styling hints.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl ChartSpec {
    /// Render the chart as a markdown table, one row per dataset.
    #[must_use]
    pub fn to_markdown_table(&self) -> String {
        let mut out = String::new();

        out.push('|');
        out.push_str(" |");
        for label in &self.labels {
            let _ = write!(out, " {} |", label);
        }
        out.push('\n');

        out.push_str("|---|");
        for _ in &self.labels {
            out.push_str("---|");
        }
        out.push('\n');

        for (i, dataset) in self.datasets.iter().enumerate() {
            let name = dataset
                .label
                .clone()
                .unwrap_or_else(|| format!("series {}", i + 1));
            let _ = write!(out, "| {} |", name);
            for idx in 0..self.labels.len() {
                match dataset.data.get(idx).copied().flatten() {
                    Some(value) => {
                        let _ = write!(out, " {} |", value);
                    }
                    None => out.push_str(" - |"),
                }
            }
            out.push('\n');
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_payload_is_kept_verbatim() {
        let raw = json!({"labels": ["Q1"], "datasets": [{"data": [1]}], "extraKey": true});
        let payload = ChartPayload::new(raw.clone());
        assert_eq!(payload.as_value(), &raw);
        assert_eq!(serde_json::to_value(&payload).unwrap(), raw);
    }

    #[test]
    fn test_spec_defaults_to_bar() {
        let payload = ChartPayload::new(json!({
            "labels": ["Q1", "Q2"],
            "datasets": [{"data": [1, 2]}]
        }));
        let spec = payload.spec().unwrap();
        assert_eq!(spec.chart_type, ChartKind::Bar);
        assert_eq!(spec.labels, vec!["Q1", "Q2"]);
        assert_eq!(spec.datasets[0].data, vec![Some(1.0), Some(2.0)]);
        assert!(spec.title.is_none());
    }

    #[test]
    fn test_spec_requires_labels_and_datasets() {
        assert!(ChartPayload::new(json!({"labels": ["Q1"]})).spec().is_none());
        assert!(ChartPayload::new(json!({"datasets": []})).spec().is_none());
        assert!(ChartPayload::new(json!("not a chart")).spec().is_none());
    }

    #[test]
    fn test_combo_chart_with_gaps_and_hints() {
        let payload = ChartPayload::new(json!({
            "chartType": "combo",
            "title": "营业收入对比",
            "labels": ["2023年", "2024年"],
            "datasets": [
                {"type": "bar", "label": "增长额(万)", "data": [null, 12.5], "yAxisID": "y",
                 "backgroundColor": "rgba(54, 162, 235, 0.8)"},
                {"type": "line", "label": "增长率(%)", "data": [null, 3.2], "yAxisID": "y1"}
            ],
            "options": {"scales": {"y1": {"position": "right"}}}
        }));

        assert_eq!(payload.title(), Some("营业收入对比"));
        let spec = payload.spec().unwrap();
        assert_eq!(spec.chart_type, ChartKind::Combo);
        assert_eq!(spec.datasets[0].kind, Some(ChartKind::Bar));
        assert_eq!(spec.datasets[0].data, vec![None, Some(12.5)]);
        assert_eq!(spec.datasets[1].y_axis_id.as_deref(), Some("y1"));
        assert!(spec.datasets[0].extra.contains_key("backgroundColor"));
        assert!(spec.options.is_some());
    }

    #[test]
    fn test_markdown_table() {
        let spec = ChartPayload::new(json!({
            "labels": ["Q1", "Q2"],
            "datasets": [{"label": "收入", "data": [1, null]}, {"data": [2.5]}]
        }))
        .spec()
        .unwrap();

        let expected = "\
| | Q1 | Q2 |
|---|---|---|
| 收入 | 1 | - |
| series 2 | 2.5 | - |
";
        assert_eq!(spec.to_markdown_table(), expected);
    }
}
