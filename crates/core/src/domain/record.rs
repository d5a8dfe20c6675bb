use crate::domain::analysis::AnalysisResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance envelope written once per successful run: when the analysis
/// ran, which export it came from, and the result itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    #[serde(rename = "分析時間")]
    pub analyzed_at: DateTime<Utc>,

    #[serde(rename = "源檔案")]
    pub source_file: String,

    #[serde(rename = "分析結果")]
    pub result: AnalysisResult,
}
