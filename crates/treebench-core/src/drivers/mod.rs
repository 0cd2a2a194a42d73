//! Classifier drivers
//!
//! A driver adapts one classifier backend to the uniform train/test/score
//! contract. Each driver declares the native data format it reads, and
//! translates a benchmark request into backend process invocations.

mod balsa;
mod python;
mod ranger;

pub use balsa::BalsaDriver;
pub use python::PythonScriptDriver;
pub use ranger::RangerDriver;

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BenchResult;
use crate::formats::DataFormat;
use crate::runner::{ProgramInvocation, ProgramOutput, absolute_path, run_program};
use crate::scoring::{ClassificationScores, get_classification_scores};
use crate::scraper::{
    DEFAULT_STDOUT_RULES, MODEL_STDOUT_RULES, StdoutRule, get_statistics_from_time_file,
    scrape_stdout_with_rules,
};
use crate::stats::RunStatistics;

/// Hyperparameters passed uniformly to every driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Number of trees in the ensemble
    pub num_estimators: u32,

    /// Maximum tree depth (None = backend default)
    #[serde(default)]
    pub max_tree_depth: Option<u32>,

    /// Threads the backend may use
    #[serde(default = "default_num_threads")]
    pub num_threads: u32,
}

fn default_num_threads() -> u32 {
    1
}

impl Hyperparameters {
    /// Create hyperparameters with the backend's default depth
    pub fn new(num_estimators: u32, num_threads: u32) -> Self {
        Self {
            num_estimators,
            max_tree_depth: None,
            num_threads,
        }
    }

    /// Limit the tree depth
    pub fn with_max_tree_depth(mut self, depth: u32) -> Self {
        self.max_tree_depth = Some(depth);
        self
    }

    /// Short label used in job identifiers, e.g. `e100-d8-t4`
    pub fn label(&self) -> String {
        let depth = self
            .max_tree_depth
            .map(|d| d.to_string())
            .unwrap_or_else(|| "auto".to_string());
        format!("e{}-d{}-t{}", self.num_estimators, depth, self.num_threads)
    }
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self::new(100, default_num_threads())
    }
}

/// Train/test files of a dataset in one native format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetFiles {
    pub train_data: PathBuf,
    pub train_labels: PathBuf,
    pub test_data: PathBuf,
    pub test_labels: PathBuf,
}

impl DatasetFiles {
    /// Resolve every file against the harness working directory
    pub fn absolutize(&self) -> BenchResult<Self> {
        Ok(Self {
            train_data: absolute_path(&self.train_data)?,
            train_labels: absolute_path(&self.train_labels)?,
            test_data: absolute_path(&self.test_data)?,
            test_labels: absolute_path(&self.test_labels)?,
        })
    }
}

/// Everything a driver needs for one benchmark run
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Exclusive working directory of the job
    pub run_path: PathBuf,

    /// Dataset files in the driver's native format
    pub dataset: DatasetFiles,

    /// Hyperparameters of the job
    pub hyperparameters: Hyperparameters,

    /// Deadline shared by every backend process of the job
    pub deadline: Option<Instant>,
}

impl RunContext {
    /// Create a context without a deadline
    pub fn new(run_path: impl Into<PathBuf>, dataset: DatasetFiles, hyperparameters: Hyperparameters) -> Self {
        Self {
            run_path: run_path.into(),
            dataset,
            hyperparameters,
            deadline: None,
        }
    }

    /// Set the job deadline
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Start an invocation of `executable` inside the run directory
    pub fn invocation(&self, executable: impl Into<PathBuf>) -> ProgramInvocation {
        ProgramInvocation::new(executable, &self.run_path).with_deadline(self.deadline)
    }

    /// Path of a file inside the run directory
    pub fn run_file(&self, name: &str) -> PathBuf {
        self.run_path.join(name)
    }
}

/// Benchmark phase that invokes a backend process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Train,
    Test,
}

impl Phase {
    /// Statistic key prefix of the phase
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Phase::Train => "train-",
            Phase::Test => "test-",
        }
    }

    /// Timing artifact name of the phase
    pub fn time_file(&self) -> &'static str {
        match self {
            Phase::Train => "train.time",
            Phase::Test => "test.time",
        }
    }

    /// Stdout rules scraped in the phase
    ///
    /// Backend-reported accuracy only means something after inference.
    pub fn stdout_rules(&self) -> &'static [StdoutRule] {
        match self {
            Phase::Train => MODEL_STDOUT_RULES,
            Phase::Test => DEFAULT_STDOUT_RULES,
        }
    }
}

/// Run one backend invocation for `phase` and merge its statistics
///
/// The invocation is timed into the phase's timing artifact; timing and
/// stdout statistics land under the phase prefix.
pub async fn execute_phase(
    invocation: ProgramInvocation,
    phase: Phase,
    stats: &mut RunStatistics,
) -> BenchResult<ProgramOutput> {
    let invocation = invocation.with_time_file(phase.time_file());
    let output = run_program(&invocation).await?;

    get_statistics_from_time_file(
        &invocation.cwd.join(phase.time_file()),
        stats,
        phase.key_prefix(),
    )
    .await?;
    scrape_stdout_with_rules(&output.stdout, phase.stdout_rules(), stats, phase.key_prefix())?;

    Ok(output)
}

/// Uniform contract implemented by every classifier backend adapter
#[async_trait]
pub trait ClassifierDriver: Send + Sync {
    /// Driver type name, as used in configuration files
    fn driver_name(&self) -> &'static str;

    /// Native format of the dataset and label files this driver reads
    fn data_format(&self) -> DataFormat;

    /// Format of the prediction file written by the backend
    fn prediction_format(&self) -> DataFormat {
        self.data_format()
    }

    /// Check at configuration time that the backend can be invoked
    fn validate(&self) -> BenchResult<()>;

    /// Train a model, merging statistics under `train-`
    async fn train(&self, ctx: &RunContext, stats: &mut RunStatistics) -> BenchResult<()>;

    /// Run inference on the test data, merging statistics under `test-`
    ///
    /// Returns the path of the prediction file written by the backend.
    async fn test(&self, ctx: &RunContext, stats: &mut RunStatistics) -> BenchResult<PathBuf>;

    /// Decode predicted and true labels and record scores under `test-`
    async fn score(
        &self,
        ctx: &RunContext,
        predictions: &Path,
        stats: &mut RunStatistics,
    ) -> BenchResult<ClassificationScores> {
        let predicted = self.prediction_format().load_labels(predictions).await?;
        let truth = self.data_format().load_labels(&ctx.dataset.test_labels).await?;
        get_classification_scores(&predicted, &truth, stats, Phase::Test.key_prefix())
    }

    /// Train, test and score in sequence, returning the merged statistics
    async fn run(&self, ctx: &RunContext) -> BenchResult<RunStatistics> {
        let mut stats = RunStatistics::new();
        self.train(ctx, &mut stats).await?;
        let predictions = self.test(ctx, &mut stats).await?;
        self.score(ctx, &predictions, &mut stats).await?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hyperparameter_label() {
        let hp = Hyperparameters::new(150, 4);
        assert_eq!(hp.label(), "e150-dauto-t4");
        assert_eq!(hp.with_max_tree_depth(8).label(), "e150-d8-t4");
    }

    #[test]
    fn test_hyperparameters_deserialize_defaults() {
        let hp: Hyperparameters = serde_json::from_str(r#"{"num_estimators": 10}"#).unwrap();
        assert_eq!(hp.max_tree_depth, None);
        assert_eq!(hp.num_threads, 1);
    }

    #[test]
    fn test_absolutize_dataset_files() {
        let files = DatasetFiles {
            train_data: PathBuf::from("data/train.bin"),
            train_labels: PathBuf::from("data/train-labels.bin"),
            test_data: PathBuf::from("/srv/data/test.bin"),
            test_labels: PathBuf::from("/srv/data/test-labels.bin"),
        };
        let resolved = files.absolutize().unwrap();
        assert!(resolved.train_data.is_absolute());
        assert!(resolved.train_labels.ends_with("data/train-labels.bin"));
        assert_eq!(resolved.test_data, PathBuf::from("/srv/data/test.bin"));
    }

    #[test]
    fn test_phase_naming() {
        assert_eq!(Phase::Train.key_prefix(), "train-");
        assert_eq!(Phase::Test.time_file(), "test.time");
        assert!(!Phase::Train.stdout_rules().iter().any(|r| r.tag == "accuracy"));
        assert!(Phase::Test.stdout_rules().iter().any(|r| r.tag == "accuracy"));
    }
}
