//! Aggregation of job results into a benchmark summary

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::orchestrator::JobResult;

/// Per-classifier aggregate over its jobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierSummary {
    pub jobs: usize,
    pub completed: usize,
    pub failed: usize,

    /// Mean `test-accuracy` over completed jobs with a defined accuracy
    pub mean_accuracy: Option<f64>,

    /// Mean `train-wall-time` in seconds
    pub mean_train_wall_time: Option<f64>,

    /// Mean `test-wall-time` in seconds
    pub mean_test_wall_time: Option<f64>,
}

/// Summary of a whole benchmark run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    pub total_jobs: usize,
    pub completed_jobs: usize,
    pub failed_jobs: usize,

    /// Failed job count per error kind
    pub failures_by_kind: BTreeMap<String, usize>,

    /// Aggregates per classifier name
    pub by_classifier: BTreeMap<String, ClassifierSummary>,

    /// Individual job results in planning order
    pub job_results: Vec<JobResult>,

    pub total_execution_time_secs: f64,
    pub timestamp: DateTime<Utc>,
    pub treebench_version: String,
}

impl BenchmarkSummary {
    /// Results of completed jobs
    pub fn completed(&self) -> impl Iterator<Item = &JobResult> {
        self.job_results.iter().filter(|r| r.is_completed())
    }

    /// Results of failed jobs
    pub fn failed(&self) -> impl Iterator<Item = &JobResult> {
        self.job_results.iter().filter(|r| !r.is_completed())
    }
}

/// Builds a [`BenchmarkSummary`] from job results
pub struct SummaryAggregator {
    version: String,
}

impl Default for SummaryAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryAggregator {
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Aggregate results into a summary
    pub fn aggregate(&self, results: Vec<JobResult>, total_time_secs: f64) -> BenchmarkSummary {
        let completed_jobs = results.iter().filter(|r| r.is_completed()).count();

        let mut failures_by_kind: BTreeMap<String, usize> = BTreeMap::new();
        for kind in results.iter().filter_map(|r| r.failure_kind()) {
            *failures_by_kind.entry(kind.to_string()).or_default() += 1;
        }

        let mut grouped: BTreeMap<&str, Vec<&JobResult>> = BTreeMap::new();
        for result in &results {
            grouped.entry(result.classifier.as_str()).or_default().push(result);
        }
        let by_classifier = grouped
            .into_iter()
            .map(|(name, jobs)| (name.to_string(), Self::summarize_classifier(&jobs)))
            .collect();

        BenchmarkSummary {
            total_jobs: results.len(),
            completed_jobs,
            failed_jobs: results.len() - completed_jobs,
            failures_by_kind,
            by_classifier,
            job_results: results,
            total_execution_time_secs: total_time_secs,
            timestamp: Utc::now(),
            treebench_version: self.version.clone(),
        }
    }

    fn summarize_classifier(jobs: &[&JobResult]) -> ClassifierSummary {
        let completed: Vec<&JobResult> = jobs.iter().copied().filter(|r| r.is_completed()).collect();
        let mean_of = |key: &str| mean(completed.iter().filter_map(|r| r.statistics.get_f64(key)));

        ClassifierSummary {
            jobs: jobs.len(),
            completed: completed.len(),
            failed: jobs.len() - completed.len(),
            mean_accuracy: mean_of("test-accuracy"),
            mean_train_wall_time: mean_of("train-wall-time"),
            mean_test_wall_time: mean_of("test-wall-time"),
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
