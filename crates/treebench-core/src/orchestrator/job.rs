//! Benchmark job types
//!
//! A job is one (classifier, dataset, hyperparameters) combination.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::drivers::{DatasetFiles, Hyperparameters};
use crate::error::BenchError;
use crate::stats::RunStatistics;

/// One planned benchmark execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    /// Unique identifier, `<classifier>-<dataset>-<hyperparameter label>`
    pub id: String,

    /// Registered classifier name
    pub classifier: String,

    /// Dataset name
    pub dataset: String,

    /// Dataset files in the classifier's native format
    pub files: DatasetFiles,

    pub hyperparameters: Hyperparameters,
}

impl JobSpec {
    pub fn new(
        classifier: impl Into<String>,
        dataset: impl Into<String>,
        files: DatasetFiles,
        hyperparameters: Hyperparameters,
    ) -> Self {
        let classifier = classifier.into();
        let dataset = dataset.into();
        let id = format!("{}-{}-{}", classifier, dataset, hyperparameters.label());
        Self {
            id,
            classifier,
            dataset,
            files,
            hyperparameters,
        }
    }
}

/// Lifecycle state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Training,
    Testing,
    Scoring,
    Completed,
    Failed,
}

impl JobState {
    /// Whether no further transition can happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// Next state after the current phase returned successfully
    pub fn advance(self) -> JobState {
        match self {
            JobState::Pending => JobState::Training,
            JobState::Training => JobState::Testing,
            JobState::Testing => JobState::Scoring,
            JobState::Scoring => JobState::Completed,
            terminal => terminal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Training => "training",
            JobState::Testing => "testing",
            JobState::Scoring => "scoring",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure marker recorded on a failed job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    /// Error code, see [`BenchError::kind`]
    pub kind: String,

    /// Human-readable error message
    pub message: String,

    /// State the job was in when the error occurred
    pub phase: JobState,
}

impl JobFailure {
    pub fn from_error(error: &BenchError, phase: JobState) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
            phase,
        }
    }
}

/// Outcome of one job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: String,
    pub classifier: String,
    pub dataset: String,
    pub hyperparameters: Hyperparameters,

    /// Final state, `Completed` or `Failed`
    pub state: JobState,

    /// Set when `state` is `Failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<JobFailure>,

    /// Statistics merged so far; partial for failed jobs
    pub statistics: RunStatistics,

    /// Wall-clock duration of the whole job
    pub elapsed_secs: f64,

    /// Run directory, when preserved on disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_dir: Option<PathBuf>,

    pub timestamp: DateTime<Utc>,
}

impl JobResult {
    /// Create a result for `job` in the given state
    pub fn new(job: &JobSpec, state: JobState, statistics: RunStatistics) -> Self {
        Self {
            job_id: job.id.clone(),
            classifier: job.classifier.clone(),
            dataset: job.dataset.clone(),
            hyperparameters: job.hyperparameters,
            state,
            failure: None,
            statistics,
            elapsed_secs: 0.0,
            run_dir: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a failed result
    pub fn failed(job: &JobSpec, error: &BenchError, phase: JobState, statistics: RunStatistics) -> Self {
        let mut result = Self::new(job, JobState::Failed, statistics);
        result.failure = Some(JobFailure::from_error(error, phase));
        result
    }

    pub fn is_completed(&self) -> bool {
        self.state == JobState::Completed
    }

    /// Error kind of a failed job
    pub fn failure_kind(&self) -> Option<&str> {
        self.failure.as_ref().map(|f| f.kind.as_str())
    }

    /// Test accuracy recorded by the scorer
    pub fn accuracy(&self) -> Option<f64> {
        self.statistics.get_f64("test-accuracy")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files() -> DatasetFiles {
        DatasetFiles {
            train_data: PathBuf::from("train.bin"),
            train_labels: PathBuf::from("train-labels.bin"),
            test_data: PathBuf::from("test.bin"),
            test_labels: PathBuf::from("test-labels.bin"),
        }
    }

    #[test]
    fn test_job_id() {
        let job = JobSpec::new("balsa", "mnist", files(), Hyperparameters::new(10, 2));
        assert_eq!(job.id, "balsa-mnist-e10-dauto-t2");
    }

    #[test]
    fn test_state_machine() {
        let mut state = JobState::Pending;
        let mut visited = vec![state];
        while !state.is_terminal() {
            state = state.advance();
            visited.push(state);
        }
        assert_eq!(
            visited,
            vec![
                JobState::Pending,
                JobState::Training,
                JobState::Testing,
                JobState::Scoring,
                JobState::Completed
            ]
        );
        assert_eq!(JobState::Failed.advance(), JobState::Failed);
    }

    #[test]
    fn test_failed_result_serialization() {
        let job = JobSpec::new("ranger", "iris", files(), Hyperparameters::default());
        let error = BenchError::BackendExecution {
            command: "ranger --file x".to_string(),
            exit_code: Some(2),
            stderr: String::new(),
        };
        let result = JobResult::failed(&job, &error, JobState::Training, RunStatistics::new());
        assert_eq!(result.failure_kind(), Some("backend_execution"));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["failure"]["phase"], "training");
        assert!(json.get("run_dir").is_none());
    }
}
