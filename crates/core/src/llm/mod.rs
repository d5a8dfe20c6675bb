pub mod anthropic;
pub mod error;
pub mod json;

use crate::domain::analysis::AnalysisResult;

/// One prompt's worth of screening data.
#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub analysis_date: chrono::NaiveDate,

    /// Rendered key-column table, ready to embed in the prompt.
    pub data_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
}

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn analyze(&self, input: AnalysisInput) -> anyhow::Result<AnalysisResult>;
}
