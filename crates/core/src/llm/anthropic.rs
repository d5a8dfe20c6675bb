use crate::config::Settings;
use crate::domain::analysis::AnalysisResult;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::json;
use crate::llm::{AnalysisInput, LlmClient, Provider};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-5-haiku-20241022";
const DEFAULT_MAX_TOKENS: u32 = 2000;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_anthropic_api_key()?.to_string();
        let base_url =
            std::env::var("ANTHROPIC_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let max_tokens = std::env::var("ANTHROPIC_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let timeout_secs = std::env::var("ANTHROPIC_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
            max_tokens,
        })
    }

    async fn create_message(
        &self,
        req: CreateMessageRequest,
    ) -> anyhow::Result<CreateMessageResponse> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(&req)
            .send()
            .await
            .context("Anthropic request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Anthropic response body")?;
        if !status.is_success() {
            return Err(LlmDiagnosticsError {
                provider: Provider::Anthropic,
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
            }
            .into());
        }

        serde_json::from_str::<CreateMessageResponse>(&text)
            .with_context(|| format!("failed to decode Anthropic response: {text}"))
    }

    fn user_prompt(input: &AnalysisInput) -> String {
        let schema = [
            "{",
            "  \"stocks\": [",
            "    {",
            "      \"代號\": \"xxxx\",",
            "      \"名稱\": \"xxxx\",",
            "      \"技術評分\": 7.5,",
            "      \"籌碼評分\": 6.0,",
            "      \"美股評分\": 5.0,",
            "      \"綜合評分\": 6.3,",
            "      \"預測\": \"偏多/中性/偏弱\",",
            "      \"預測區間\": {\"低\": 100, \"高\": 120},",
            "      \"操作建議\": \"買進/持有/賣出\",",
            "      \"理由\": \"詳細說明\"",
            "    }",
            "  ],",
            "  \"市場觀點\": \"整體市場評論\"",
            "}",
        ]
        .join("\n");

        format!(
            "你是專業台灣股票分析師，使用以下權重評分：\n\
             - 技術面：45%（K值、RSI、MACD）\n\
             - 籌碼面：35%（外資、投信、券資比）\n\
             - 美股連動：20%（與NVDA/AAPL等的相關性）\n\n\
             分析日期：{}\n\n\
             數據：\n{}\n\n\
             請以JSON返回分析，包含：\n{}",
            input.analysis_date.format("%Y-%m-%d"),
            input.data_text,
            schema
        )
    }

    fn response_text(res: &CreateMessageResponse) -> String {
        let mut out = String::new();
        for block in &res.content {
            match block {
                ContentBlock::Text { text } => {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    out.push_str(text);
                }
                ContentBlock::Thinking { .. }
                | ContentBlock::RedactedThinking { .. }
                | ContentBlock::Unknown => {
                    // Only text blocks carry the reply.
                }
            }
        }
        out
    }
}

#[async_trait::async_trait]
impl LlmClient for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    /// One request per run: no retries, no repair round-trips. A truncated
    /// reply surfaces as an extraction failure.
    async fn analyze(&self, input: AnalysisInput) -> anyhow::Result<AnalysisResult> {
        let req = CreateMessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: Self::user_prompt(&input),
            }],
        };

        let res = self.create_message(req).await?;

        if matches!(res.stop_reason.as_deref(), Some("max_tokens")) {
            tracing::warn!(
                max_tokens = self.max_tokens,
                "Anthropic stop_reason=max_tokens; reply may be truncated"
            );
        }

        let text = Self::response_text(&res);
        match json::extract_json(&text) {
            Ok(value) => {
                // `{"error": ...}` replies land in the Failure variant.
                serde_json::from_value::<AnalysisResult>(value)
                    .context("failed to interpret extracted JSON as an analysis result")
            }
            Err(err) => Err(LlmDiagnosticsError {
                provider: Provider::Anthropic,
                stage: "extract",
                detail: err.to_string(),
                raw_output: Some(text),
            }
            .into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct CreateMessageRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlock>,

    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(rename = "thinking")]
    Thinking {
        #[serde(default)]
        thinking: String,
        #[serde(default)]
        signature: String,
    },

    #[serde(rename = "redacted_thinking")]
    RedactedThinking {
        #[serde(default)]
        data: String,
    },

    #[serde(other)]
    Unknown,
}
