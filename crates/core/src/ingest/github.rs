use crate::config::Settings;
use crate::ingest::artifact::ArtifactEntry;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://api.github.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

// GitHub rejects requests without a User-Agent.
const USER_AGENT_VALUE: &str = "twanalyst";

#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
    repo: String,
    data_dir: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_base =
            std::env::var("GITHUB_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        let timeout_secs = std::env::var("GITHUB_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build GitHub http client")?;

        Ok(Self {
            http,
            api_base,
            repo: settings.github_repo.clone(),
            data_dir: settings.github_data_dir.clone(),
            token: settings.github_token.clone(),
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        if let Some(token) = &self.token {
            headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
        }
        Ok(headers)
    }

    /// Lists the screening data directory of the configured repository.
    pub async fn list_data_dir(&self) -> Result<Vec<ArtifactEntry>> {
        let url = format!(
            "{}/repos/{}/contents/{}",
            self.api_base.trim_end_matches('/'),
            self.repo,
            self.data_dir
        );

        let res = self
            .http
            .get(&url)
            .headers(self.headers()?)
            .send()
            .await
            .context("GitHub listing request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read GitHub listing body")?;
        if !status.is_success() {
            anyhow::bail!("GitHub listing HTTP {status}: {text}");
        }

        let entries = serde_json::from_str::<Vec<ArtifactEntry>>(&text)
            .with_context(|| format!("GitHub listing is not a file array: {text}"))?;
        tracing::debug!(count = entries.len(), %url, "listed data directory");
        Ok(entries)
    }

    /// Downloads a raw file and decodes it as UTF-8, stripping a leading BOM
    /// and replacing invalid sequences.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let res = self
            .http
            .get(url)
            .headers(self.headers()?)
            .send()
            .await
            .context("file download request failed")?;

        let status = res.status();
        if !status.is_success() {
            anyhow::bail!("file download HTTP {status} from {url}");
        }

        let bytes = res
            .bytes()
            .await
            .context("failed to read downloaded file body")?;

        let (decoded, _, _) = encoding_rs::UTF_8.decode(&bytes);
        Ok(decoded.into_owned())
    }
}
