//! Classifier benchmarking harness
//!
//! Runs tree-ensemble classifiers from different providers on a common
//! train/test workload and turns their raw outputs into comparable metrics.
//!
//! # Layers
//!
//! - **runner**: spawns backend programs in an exclusive working directory,
//!   captures output and writes a timing artifact per invocation
//! - **scraper**: extracts statistics from timing artifacts and stdout
//! - **scoring**: compares predicted and true label sequences
//! - **drivers**: one adapter per backend behind [`ClassifierDriver`]
//! - **orchestrator**: plans jobs and runs them through
//!   train → test → score, isolating failures per job
//!
//! # Example
//!
//! ```rust,ignore
//! use treebench_core::{BenchConfig, BenchmarkOrchestrator, ClassifierRegistry, OrchestratorOptions, plan_jobs};
//!
//! let config = BenchConfig::load("bench.toml".as_ref())?;
//! let registry = ClassifierRegistry::from_config(&config)?;
//! registry.validate()?;
//! let jobs = plan_jobs(&config, &registry, &[], &[])?;
//! let orchestrator = BenchmarkOrchestrator::new(&registry, OrchestratorOptions::from_config(&config));
//! let summary = orchestrator.run_all(jobs).await?;
//! ```

pub mod config;
pub mod drivers;
pub mod error;
pub mod formats;
pub mod orchestrator;
pub mod registry;
pub mod report;
pub mod runner;
pub mod scoring;
pub mod scraper;
pub mod stats;

pub use config::{BenchConfig, ClassifierConfig, DatasetConfig};
pub use drivers::{ClassifierDriver, DatasetFiles, Hyperparameters, Phase, RunContext};
pub use error::{BenchError, BenchResult};
pub use formats::DataFormat;
pub use orchestrator::{
    BenchmarkOrchestrator, JobFailure, JobProgress, JobResult, JobSpec, JobState,
    OrchestratorOptions, plan_jobs,
};
pub use registry::{ClassifierRegistry, RegisteredClassifier};
pub use report::{BenchmarkSummary, ReportFormat, generate_report};
pub use scoring::{ClassificationScores, get_classification_scores};
pub use stats::{MetricValue, RunStatistics};
