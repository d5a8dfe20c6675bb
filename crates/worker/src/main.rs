use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use twanalyst_core::config::{self, Settings};
use twanalyst_core::domain::analysis::AnalysisResult;
use twanalyst_core::ingest::artifact::select_latest;
use twanalyst_core::ingest::github::GithubClient;
use twanalyst_core::ingest::table::CsvTable;
use twanalyst_core::llm::anthropic::AnthropicClient;
use twanalyst_core::llm::error::LlmDiagnosticsError;
use twanalyst_core::llm::{AnalysisInput, LlmClient};

#[derive(Debug, Parser)]
#[command(name = "twanalyst_worker")]
struct Args {
    /// Where to write analysis_<timestamp>.json. Defaults to OUTPUT_DIR.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Fetch and render the prompt data, but call no model and write
    /// nothing.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let output_dir = args
        .output_dir
        .unwrap_or_else(|| PathBuf::from(&settings.output_dir));

    let analysis_date = taipei_date_today()?;
    tracing::info!(%analysis_date, repo = %settings.github_repo, "starting stock analysis run");

    let github = GithubClient::from_settings(&settings)?;

    let entries = match github.list_data_dir().await {
        Ok(entries) => entries,
        Err(err) => return abort_run(err, "listing the data directory failed"),
    };

    let Some(latest) = select_latest(&entries, config::ARTIFACT_PREFIX, config::ARTIFACT_SUFFIX)
    else {
        tracing::error!(
            dir = %settings.github_data_dir,
            "no stock_analysis_*.csv in the data directory; nothing to analyze"
        );
        return Ok(());
    };

    let Some(download_url) = latest.download_url.as_deref() else {
        tracing::error!(file = %latest.name, "selected artifact has no download URL");
        return Ok(());
    };

    let csv_text = match github.fetch_text(download_url).await {
        Ok(text) => text,
        Err(err) => return abort_run(err, "downloading the screening export failed"),
    };

    let table = match CsvTable::parse(&csv_text) {
        Ok(table) => table,
        Err(err) => return abort_run(err, "parsing the screening export failed"),
    };
    tracing::info!(file = %latest.name, rows = table.len(), "loaded screening export");

    let data_text = table
        .filter_numeric_gt(config::TECHNICAL_SCORE_COLUMN, 0.0)
        .project(&config::KEY_COLUMNS)
        .to_text();

    if args.dry_run {
        tracing::info!(
            dry_run = true,
            prompt_bytes = data_text.len(),
            "dry-run: skipping model call and persistence"
        );
        return Ok(());
    }

    let llm = AnthropicClient::from_settings(&settings)?;
    let input = AnalysisInput {
        analysis_date,
        data_text,
    };

    let result = match llm.analyze(input).await {
        Ok(result) => result,
        Err(err) => {
            if let Some(raw) = err
                .downcast_ref::<LlmDiagnosticsError>()
                .and_then(|diag| diag.raw_output.as_deref())
            {
                tracing::error!(raw_output = %raw, "raw model output of the failed run");
            }
            return abort_run(err, "analysis failed");
        }
    };

    if let AnalysisResult::Failure { error } = &result {
        tracing::error!(%error, "model reported an analysis error; nothing persisted");
        return Ok(());
    }

    tracing::info!(stocks = result.stock_count(), "analysis complete");

    // Directory or write failures propagate; everything earlier only logs.
    let path = twanalyst_core::storage::output::persist(
        &result,
        &latest.name,
        &output_dir,
        chrono::Utc::now(),
    )?;

    tracing::info!(path = %path.display(), "analysis persisted");
    Ok(())
}

/// Terminal status for any failure before persistence: captured, logged,
/// and the process exits cleanly with nothing written.
fn abort_run(err: anyhow::Error, what: &str) -> anyhow::Result<()> {
    sentry_anyhow::capture_anyhow(&err);
    let detail = format!("{err:#}");
    tracing::error!(error = %detail, "{what}; nothing persisted");
    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

/// Taipei local date (UTC+8); both the export and the prompt use it.
fn taipei_date_today() -> anyhow::Result<chrono::NaiveDate> {
    let tst = chrono::FixedOffset::east_opt(8 * 3600).context("invalid Taipei offset")?;
    Ok(chrono::Utc::now().with_timezone(&tst).date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_run_turns_any_failure_into_a_clean_exit() {
        // Transport and parse failures log a terminal status instead of
        // propagating out of main.
        let err = anyhow::anyhow!("connection refused").context("GitHub listing request failed");
        assert!(abort_run(err, "listing the data directory failed").is_ok());
    }

    #[test]
    fn raw_model_output_is_recoverable_from_the_analyze_error() {
        let err: anyhow::Error = LlmDiagnosticsError {
            provider: twanalyst_core::llm::Provider::Anthropic,
            stage: "extract",
            detail: "no JSON object found".to_string(),
            raw_output: Some("我無法分析這些數據。".to_string()),
        }
        .into();

        let raw = err
            .downcast_ref::<LlmDiagnosticsError>()
            .and_then(|diag| diag.raw_output.as_deref());
        assert_eq!(raw, Some("我無法分析這些數據。"));
    }
}
