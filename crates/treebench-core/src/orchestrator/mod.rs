//! Benchmark orchestration
//!
//! Plans (classifier, dataset, hyperparameters) jobs and runs each one
//! through `Pending → Training → Testing → Scoring → Completed`, with
//! `Failed` reachable from every non-terminal state.

mod executor;
mod job;
mod planner;

pub use executor::{BenchmarkOrchestrator, JobProgress, OrchestratorOptions, ProgressCallback};
pub use job::{JobFailure, JobResult, JobSpec, JobState};
pub use planner::plan_jobs;
