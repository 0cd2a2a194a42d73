//! JSON report generation

use std::path::{Path, PathBuf};

use chrono::Utc;

use super::BenchmarkSummary;
use crate::error::{BenchError, BenchResult};

/// JSON report generator
pub struct JsonReporter;

impl JsonReporter {
    /// Generate a pretty-printed JSON report
    pub fn generate(summary: &BenchmarkSummary) -> BenchResult<String> {
        serde_json::to_string_pretty(summary)
            .map_err(|e| BenchError::Io(format!("Failed to encode JSON report: {}", e)))
    }

    /// Write the report to `<dir>/bench_results_<timestamp>.json`
    pub async fn save(summary: &BenchmarkSummary, dir: &Path) -> BenchResult<PathBuf> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| BenchError::io(format!("Failed to create {:?}", dir), e))?;

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let output_path = dir.join(format!("bench_results_{}.json", timestamp));

        let json = Self::generate(summary)?;
        tokio::fs::write(&output_path, json)
            .await
            .map_err(|e| BenchError::io(format!("Failed to write {:?}", output_path), e))?;

        tracing::info!("Saved benchmark results to {:?}", output_path);
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::SummaryAggregator;
    use crate::report::summary::tests::sample_results;

    #[test]
    fn test_json_marks_failed_jobs() {
        let summary = SummaryAggregator::new().aggregate(sample_results(), 4.0);
        let json = JsonReporter::generate(&summary).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["completed_jobs"], 2);
        assert_eq!(value["job_results"][0]["statistics"]["test-accuracy"], 0.75);
        assert_eq!(value["job_results"][2]["failure"]["kind"], "timeout");
    }

    #[tokio::test]
    async fn test_save_writes_timestamped_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let summary = SummaryAggregator::new().aggregate(sample_results(), 4.0);

        let path = JsonReporter::save(&summary, &dir.path().join("results")).await.unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("bench_results_"));
        assert!(name.ends_with(".json"));

        let loaded: BenchmarkSummary =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.failed_jobs, 1);
    }
}
