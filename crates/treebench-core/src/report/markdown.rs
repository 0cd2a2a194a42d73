//! Markdown report generation

use super::{BenchmarkSummary, format_optional, job_status};

/// Markdown report generator
pub struct MarkdownReporter;

impl MarkdownReporter {
    /// Generate a Markdown report
    pub fn generate(summary: &BenchmarkSummary) -> String {
        let mut md = String::new();

        md.push_str("# Classifier Benchmark Report\n\n");

        md.push_str("## Overview\n\n");
        md.push_str(&format!("- **treebench**: {}\n", summary.treebench_version));
        md.push_str(&format!(
            "- **Timestamp**: {}\n",
            summary.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        md.push_str(&format!(
            "- **Jobs**: {} completed, {} failed, {} total\n",
            summary.completed_jobs, summary.failed_jobs, summary.total_jobs
        ));
        md.push_str(&format!(
            "- **Total Execution Time**: {:.1}s\n\n",
            summary.total_execution_time_secs
        ));

        md.push_str("## Results by Classifier\n\n");
        md.push_str("| Classifier | Jobs | Completed | Failed | Mean Accuracy | Mean Train (s) | Mean Test (s) |\n");
        md.push_str("|------------|------|-----------|--------|---------------|----------------|---------------|\n");
        for (name, classifier) in &summary.by_classifier {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} |\n",
                name,
                classifier.jobs,
                classifier.completed,
                classifier.failed,
                format_optional(classifier.mean_accuracy, 4),
                format_optional(classifier.mean_train_wall_time, 2),
                format_optional(classifier.mean_test_wall_time, 2),
            ));
        }
        md.push('\n');

        md.push_str("## Jobs\n\n");
        md.push_str("| Job | Status | Accuracy | Train (s) | Test (s) | Error |\n");
        md.push_str("|-----|--------|----------|-----------|----------|-------|\n");
        for result in &summary.job_results {
            let error = result
                .failure
                .as_ref()
                .map(|f| format!("{} during {}", f.kind, f.phase))
                .unwrap_or_default();
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                result.job_id,
                job_status(result),
                format_optional(result.accuracy(), 4),
                format_optional(result.statistics.get_f64("train-wall-time"), 2),
                format_optional(result.statistics.get_f64("test-wall-time"), 2),
                error,
            ));
        }

        if !summary.failures_by_kind.is_empty() {
            md.push_str("\n## Failures\n\n");
            for result in summary.failed() {
                if let Some(failure) = &result.failure {
                    md.push_str(&format!(
                        "- `{}` ({}): {}\n",
                        result.job_id, failure.kind, failure.message
                    ));
                }
            }
        }

        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::SummaryAggregator;
    use crate::report::summary::tests::sample_results;

    #[test]
    fn test_markdown_generation() {
        let summary = SummaryAggregator::new().aggregate(sample_results(), 4.0);
        let md = MarkdownReporter::generate(&summary);

        assert!(md.contains("# Classifier Benchmark Report"));
        assert!(md.contains("| balsa | 2 | 2 | 0 | 0.8500 |"));
        assert!(md.contains("FAILED"));
        assert!(md.contains("timeout during testing"));
    }
}
