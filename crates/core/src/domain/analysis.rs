use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Outcome of one model analysis.
///
/// Untagged so the serialized form carries the payload directly: either
/// `{"error": "..."}` or the model's object exactly as it was parsed. The
/// `Failure` variant is tried first, so a reply shaped `{"error": ...}`
/// deserializes as a failure and everything else lands in `Report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Failure { error: String },
    Report(serde_json::Value),
}

impl AnalysisResult {
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Number of entries in the report's `stocks` array, if any.
    pub fn stock_count(&self) -> usize {
        match self {
            Self::Report(value) => value
                .get("stocks")
                .and_then(|v| v.as_array())
                .map_or(0, |a| a.len()),
            Self::Failure { .. } => 0,
        }
    }

    /// Typed view of a report. The model's output is stored verbatim and not
    /// validated at parse time, so this can fail on a structurally valid but
    /// off-schema reply.
    pub fn decode_report(&self) -> anyhow::Result<AnalysisReport> {
        match self {
            Self::Report(value) => serde_json::from_value(value.clone())
                .context("analysis result does not match the report schema"),
            Self::Failure { error } => anyhow::bail!("analysis failed: {error}"),
        }
    }
}

/// The shape the prompt asks the model to return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(default)]
    pub stocks: Vec<StockEntry>,

    #[serde(rename = "市場觀點", default)]
    pub market_view: String,
}

/// One analyzed stock. Score ranges and the forecast/action labels are not
/// validated; whatever the model said is recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockEntry {
    #[serde(rename = "代號")]
    pub ticker: String,

    #[serde(rename = "名稱")]
    pub name: String,

    #[serde(rename = "技術評分")]
    pub technical_score: f64,

    #[serde(rename = "籌碼評分")]
    pub flow_score: f64,

    #[serde(rename = "美股評分")]
    pub us_score: f64,

    #[serde(rename = "綜合評分")]
    pub composite_score: f64,

    #[serde(rename = "預測")]
    pub forecast: String,

    #[serde(rename = "預測區間")]
    pub forecast_range: ForecastRange,

    #[serde(rename = "操作建議")]
    pub action: String,

    #[serde(rename = "理由")]
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRange {
    #[serde(rename = "低")]
    pub low: f64,

    #[serde(rename = "高")]
    pub high: f64,
}
