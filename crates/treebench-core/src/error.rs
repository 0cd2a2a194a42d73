//! Error types for the benchmark harness

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for harness operations
pub type BenchResult<T> = Result<T, BenchError>;

/// Errors raised while configuring or running benchmark jobs
#[derive(Error, Debug, Clone)]
pub enum BenchError {
    /// A backend executable or script could not be located
    #[error("Backend not found: {path}")]
    BackendNotFound { path: PathBuf },

    /// A backend process exited unsuccessfully
    #[error("Backend execution failed: `{command}` exited with {}: {stderr}", exit_code_display(.exit_code))]
    BackendExecution {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// A timing artifact, stdout or label file could not be parsed
    #[error("Malformed output in {source_name}: {detail}")]
    MalformedOutput { source_name: String, detail: String },

    /// Predicted and true label sequences differ in length
    #[error("Label length mismatch: {predicted} predicted labels vs {truth} true labels")]
    LabelLengthMismatch { predicted: usize, truth: usize },

    /// The requested classifier is not registered
    #[error("Unknown classifier: {0}")]
    UnknownClassifier(String),

    /// A job exceeded its deadline and its backend process was killed
    #[error("Backend `{command}` timed out after {elapsed:?}")]
    Timeout { command: String, elapsed: Duration },

    /// A statistic was written twice with different values
    #[error("Conflicting value for statistic `{key}`: {existing} vs {incoming}")]
    StatisticConflict {
        key: String,
        existing: String,
        incoming: String,
    },

    /// The benchmark configuration is invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Filesystem or process I/O failure
    #[error("I/O error: {0}")]
    Io(String),
}

fn exit_code_display(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "a signal".to_string(),
    }
}

impl BenchError {
    /// Create a malformed output error
    pub fn malformed(source_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MalformedOutput {
            source_name: source_name.into(),
            detail: detail.into(),
        }
    }

    /// Create an I/O error with context
    pub fn io(context: impl std::fmt::Display, err: std::io::Error) -> Self {
        Self::Io(format!("{}: {}", context, err))
    }

    /// Stable error code used in job results and reports
    pub fn kind(&self) -> &'static str {
        match self {
            BenchError::BackendNotFound { .. } => "backend_not_found",
            BenchError::BackendExecution { .. } => "backend_execution",
            BenchError::MalformedOutput { .. } => "malformed_output",
            BenchError::LabelLengthMismatch { .. } => "label_length_mismatch",
            BenchError::UnknownClassifier(_) => "unknown_classifier",
            BenchError::Timeout { .. } => "timeout",
            BenchError::StatisticConflict { .. } => "statistic_conflict",
            BenchError::InvalidConfig(_) => "invalid_config",
            BenchError::Io(_) => "io",
        }
    }

    /// Whether this error must abort the whole benchmark before any job runs
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            BenchError::BackendNotFound { .. }
                | BenchError::UnknownClassifier(_)
                | BenchError::InvalidConfig(_)
        )
    }
}
