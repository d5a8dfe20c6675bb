use crate::domain::analysis::AnalysisResult;
use crate::domain::record::AnalysisRecord;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Writes the provenance-stamped analysis to
/// `<output_dir>/analysis_<YYYYMMDD>_<HHMMSS>.json` and returns the path.
///
/// The directory is created if missing. A second call within the same
/// second targets the identical path and silently overwrites it. Nothing is
/// written unless serialization succeeded first.
pub fn persist(
    result: &AnalysisResult,
    source_file: &str,
    output_dir: &Path,
    now: DateTime<Utc>,
) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir {}", output_dir.display()))?;

    let filename = format!("analysis_{}.json", now.format("%Y%m%d_%H%M%S"));
    let path = output_dir.join(filename);

    let record = AnalysisRecord {
        analyzed_at: now,
        source_file: source_file.to_string(),
        result: result.clone(),
    };

    // No trailing newline: the file is exactly the pretty-printed record.
    let body =
        serde_json::to_string_pretty(&record).context("failed to serialize analysis record")?;

    std::fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn unique_output_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "twanalyst_{tag}_{}_{}",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ))
    }

    #[test]
    fn round_trips_the_record() {
        let dir = unique_output_dir("roundtrip");
        let result = AnalysisResult::Report(json!({
            "stocks": [{"代號": "2330"}],
            "市場觀點": "觀望"
        }));
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 9, 30, 0).unwrap();

        let path = persist(&result, "stock_analysis_20240105.csv", &dir, now).unwrap();
        assert_eq!(path.file_name().unwrap(), "analysis_20240105_093000.json");

        let body = std::fs::read_to_string(&path).unwrap();
        let record: AnalysisRecord = serde_json::from_str(&body).unwrap();
        assert_eq!(record.source_file, "stock_analysis_20240105.csv");
        assert_eq!(record.result, result);
        assert_eq!(record.analyzed_at, now);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn writes_non_ascii_literally_with_two_space_indent() {
        let dir = unique_output_dir("encoding");
        let result = AnalysisResult::Report(json!({"市場觀點": "偏多"}));
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 9, 30, 0).unwrap();

        let path = persist(&result, "stock_analysis_20240105.csv", &dir, now).unwrap();
        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.contains("市場觀點"));
        assert!(body.contains("偏多"));
        assert!(!body.contains("\\u"));
        assert!(body.contains("\n  \"分析時間\""));
        assert!(body.ends_with('}'));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn same_second_persist_overwrites_the_first_file() {
        let dir = unique_output_dir("overwrite");
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 9, 30, 0).unwrap();

        let first = persist(&AnalysisResult::failure("first"), "a.csv", &dir, now).unwrap();
        let second = persist(&AnalysisResult::failure("second"), "b.csv", &dir, now).unwrap();
        assert_eq!(first, second);

        let record: AnalysisRecord =
            serde_json::from_str(&std::fs::read_to_string(&second).unwrap()).unwrap();
        assert_eq!(record.source_file, "b.csv");
        assert_eq!(record.result, AnalysisResult::failure("second"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn creates_intermediate_directories() {
        let dir = unique_output_dir("nested").join("deep").join("er");
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 9, 30, 0).unwrap();

        let path = persist(&AnalysisResult::Report(json!({})), "x.csv", &dir, now).unwrap();
        assert!(path.exists());

        std::fs::remove_dir_all(dir.parent().unwrap().parent().unwrap()).unwrap();
    }
}
