//! Report generation for benchmark results
//!
//! Generates reports in various formats (table, Markdown, JSON). Every format
//! distinguishes completed jobs (with metrics) from failed jobs (with the
//! error kind).

mod json;
mod markdown;
mod summary;

pub use json::JsonReporter;
pub use markdown::MarkdownReporter;
pub use summary::{BenchmarkSummary, ClassifierSummary, SummaryAggregator};

use std::str::FromStr;

use crate::error::{BenchError, BenchResult};
use crate::orchestrator::JobResult;

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Markdown,
    Table,
}

impl FromStr for ReportFormat {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            "table" => Ok(ReportFormat::Table),
            other => Err(BenchError::InvalidConfig(format!(
                "Unknown report format '{}' (expected table, markdown or json)",
                other
            ))),
        }
    }
}

/// Generate a report in the specified format
pub fn generate_report(summary: &BenchmarkSummary, format: ReportFormat) -> BenchResult<String> {
    match format {
        ReportFormat::Json => JsonReporter::generate(summary),
        ReportFormat::Markdown => Ok(MarkdownReporter::generate(summary)),
        ReportFormat::Table => Ok(generate_table(summary)),
    }
}

pub(crate) fn job_status(result: &JobResult) -> &'static str {
    if result.is_completed() { "OK" } else { "FAILED" }
}

pub(crate) fn format_optional(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "-".to_string(),
    }
}

/// Generate a simple table report for terminal output
fn generate_table(summary: &BenchmarkSummary) -> String {
    let mut output = String::new();

    output.push_str(&format!("\n{:=<78}\n", "= Classifier Benchmark Results "));
    output.push_str(&format!(
        "treebench: {} | Timestamp: {}\n",
        summary.treebench_version,
        summary.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!("{:=<78}\n\n", ""));

    output.push_str("SUMMARY\n");
    output.push_str(&format!("{:-<78}\n", ""));
    output.push_str(&format!(
        "Jobs: {} completed, {} failed, {} total\n",
        summary.completed_jobs, summary.failed_jobs, summary.total_jobs
    ));
    output.push_str(&format!(
        "Total Time: {:.1}s\n",
        summary.total_execution_time_secs
    ));
    for (kind, count) in &summary.failures_by_kind {
        output.push_str(&format!("Failures ({}): {}\n", kind, count));
    }
    output.push('\n');

    output.push_str("BY CLASSIFIER\n");
    output.push_str(&format!("{:-<78}\n", ""));
    output.push_str(&format!(
        "{:<20} {:>6} {:>6} {:>8} {:>12} {:>10} {:>10}\n",
        "Classifier", "Jobs", "OK", "Failed", "Accuracy", "Train(s)", "Test(s)"
    ));
    output.push_str(&format!("{:-<78}\n", ""));
    for (name, classifier) in &summary.by_classifier {
        output.push_str(&format!(
            "{:<20} {:>6} {:>6} {:>8} {:>12} {:>10} {:>10}\n",
            truncate(name, 20),
            classifier.jobs,
            classifier.completed,
            classifier.failed,
            format_optional(classifier.mean_accuracy, 4),
            format_optional(classifier.mean_train_wall_time, 2),
            format_optional(classifier.mean_test_wall_time, 2),
        ));
    }
    output.push_str(&format!("{:-<78}\n\n", ""));

    output.push_str("JOB RESULTS\n");
    output.push_str(&format!("{:-<78}\n", ""));
    output.push_str(&format!(
        "{:<36} {:>8} {:>10} {:>20}\n",
        "Job", "Status", "Accuracy", "Error"
    ));
    output.push_str(&format!("{:-<78}\n", ""));
    for result in &summary.job_results {
        let error = result.failure_kind().unwrap_or("");
        output.push_str(&format!(
            "{:<36} {:>8} {:>10} {:>20}\n",
            truncate(&result.job_id, 36),
            job_status(result),
            format_optional(result.accuracy(), 4),
            error,
        ));
    }
    output.push_str(&format!("{:=<78}\n", ""));

    output
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width - 3).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}
