pub mod domain;
pub mod ingest;
pub mod llm;
pub mod storage;

pub mod config {
    use anyhow::Context;

    /// Screening columns forwarded to the model, in prompt order. Columns
    /// missing from a given export are skipped, not errored.
    pub const KEY_COLUMNS: [&str; 16] = [
        "代號",
        "名稱",
        "成交",
        "漲跌幅",
        "K值(日)",
        "D值(日)",
        "RSI6(日)",
        "RSI12(日)",
        "DIF(日)",
        "MACD(日)",
        "外資買賣超",
        "投信買賣超",
        "券資比(%)",
        "5日均線",
        "20日均線",
        "60日均線",
    ];

    /// Rows with a non-positive value in this column are dropped before
    /// prompting.
    pub const TECHNICAL_SCORE_COLUMN: &str = "技術評分";

    /// Naming convention of the daily screening export in the data dir.
    pub const ARTIFACT_PREFIX: &str = "stock_analysis_";
    pub const ARTIFACT_SUFFIX: &str = ".csv";

    const DEFAULT_GITHUB_REPO: &str = "carryvio/stock";
    const DEFAULT_DATA_DIR: &str = "data";
    const DEFAULT_OUTPUT_DIR: &str = "data/analysis_output";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub anthropic_api_key: Option<String>,
        pub github_token: Option<String>,
        pub github_repo: String,
        pub github_data_dir: String,
        pub output_dir: String,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
                github_token: std::env::var("GITHUB_TOKEN").ok(),
                github_repo: std::env::var("GITHUB_REPO")
                    .unwrap_or_else(|_| DEFAULT_GITHUB_REPO.to_string()),
                github_data_dir: std::env::var("GITHUB_DATA_DIR")
                    .unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string()),
                output_dir: std::env::var("OUTPUT_DIR")
                    .unwrap_or_else(|_| DEFAULT_OUTPUT_DIR.to_string()),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
            self.anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY is required")
        }
    }
}
