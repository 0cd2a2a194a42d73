//! Benchmark orchestrator
//!
//! Runs planned jobs through the train → test → score state machine and
//! isolates failures at the job boundary.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

use super::{JobResult, JobSpec, JobState};
use crate::config::BenchConfig;
use crate::drivers::{ClassifierDriver, RunContext};
use crate::error::BenchResult;
use crate::registry::ClassifierRegistry;
use crate::report::{BenchmarkSummary, JsonReporter, SummaryAggregator};
use crate::runner::RunDirectory;
use crate::stats::RunStatistics;

/// Callback for progress updates during a benchmark run
pub type ProgressCallback = Box<dyn Fn(JobProgress) + Send + Sync>;

/// Progress update for one job
#[derive(Debug, Clone)]
pub struct JobProgress {
    /// Job index in planning order (0-based)
    pub current: usize,
    /// Total number of jobs
    pub total: usize,
    pub job_id: String,
    /// State the job just entered
    pub state: JobState,
    pub message: String,
}

/// Run options of the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Directory holding per-job run directories
    pub work_dir: PathBuf,

    /// Jobs run concurrently
    pub max_parallel_jobs: usize,

    /// Deadline per job, shared by all of its backend processes
    pub job_timeout: Option<Duration>,

    /// Keep run directories of completed jobs (failed ones are always kept)
    pub keep_run_dirs: bool,

    /// Directory for the saved JSON summary (None = don't save)
    pub results_dir: Option<PathBuf>,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("treebench-runs"),
            max_parallel_jobs: 1,
            job_timeout: None,
            keep_run_dirs: false,
            results_dir: None,
        }
    }
}

impl OrchestratorOptions {
    /// Options taken from a benchmark configuration
    pub fn from_config(config: &BenchConfig) -> Self {
        let results_dir = config.save_results.then(|| {
            config
                .output_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from("."))
        });

        Self {
            work_dir: config.work_dir.clone(),
            max_parallel_jobs: config.max_parallel_jobs,
            job_timeout: config.job_timeout(),
            keep_run_dirs: config.keep_run_dirs,
            results_dir,
        }
    }
}

/// Runs benchmark jobs against the classifiers of a registry
pub struct BenchmarkOrchestrator<'r> {
    registry: &'r ClassifierRegistry,
    options: OrchestratorOptions,
    progress_callback: Option<ProgressCallback>,
}

impl<'r> BenchmarkOrchestrator<'r> {
    pub fn new(registry: &'r ClassifierRegistry, options: OrchestratorOptions) -> Self {
        Self {
            registry,
            options,
            progress_callback: None,
        }
    }

    /// Set progress callback
    pub fn set_progress_callback(&mut self, callback: ProgressCallback) {
        self.progress_callback = Some(callback);
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Run every job and aggregate the results
    ///
    /// The summary is saved as JSON when a results directory is configured.
    pub async fn run_all(&self, jobs: Vec<JobSpec>) -> BenchResult<BenchmarkSummary> {
        let start = Instant::now();
        let results = self.run_jobs(&jobs).await;
        let summary = SummaryAggregator::new().aggregate(results, start.elapsed().as_secs_f64());

        info!(
            completed = summary.completed_jobs,
            failed = summary.failed_jobs,
            "Benchmark finished"
        );

        if let Some(dir) = &self.options.results_dir {
            JsonReporter::save(&summary, dir).await?;
        }

        Ok(summary)
    }

    /// Run jobs with bounded concurrency, returning results in job order
    pub async fn run_jobs(&self, jobs: &[JobSpec]) -> Vec<JobResult> {
        let total = jobs.len();
        let parallel = self.options.max_parallel_jobs.max(1);
        self.check_oversubscription(jobs, parallel);

        stream::iter(jobs.iter().enumerate())
            .map(|(index, job)| self.run_job(job, index, total))
            .buffered(parallel)
            .collect()
            .await
    }

    /// Run one job through its phases
    ///
    /// Never fails: errors are recorded as a failure marker on the result.
    pub async fn run_job(&self, job: &JobSpec, index: usize, total: usize) -> JobResult {
        let start = Instant::now();
        let mut state = JobState::Pending;
        let mut stats = RunStatistics::new();

        info!(job_id = %job.id, "Starting job {}/{}", index + 1, total);

        let setup = self.registry.get(&job.classifier).and_then(|classifier| {
            RunDirectory::create(&self.options.work_dir, &job.id)
                .map(|run_dir| (classifier, run_dir))
        });
        let (classifier, mut run_dir) = match setup {
            Ok(setup) => setup,
            Err(e) => {
                error!(job_id = %job.id, error = %e, "Job setup failed");
                let mut result = JobResult::failed(job, &e, state, stats);
                result.elapsed_secs = start.elapsed().as_secs_f64();
                return result;
            }
        };

        let deadline = self.options.job_timeout.map(|timeout| start + timeout);
        let ctx = RunContext::new(run_dir.path(), job.files.clone(), job.hyperparameters)
            .with_deadline(deadline);

        let outcome = self
            .execute_phases(classifier.driver.as_ref(), &ctx, &mut stats, &mut state, job, index, total)
            .await;

        let mut result = match outcome {
            Ok(()) => {
                info!(
                    job_id = %job.id,
                    accuracy = ?stats.get_f64("test-accuracy"),
                    "Job completed"
                );
                JobResult::new(job, JobState::Completed, stats)
            }
            Err(e) => {
                error!(
                    job_id = %job.id,
                    phase = %state,
                    kind = e.kind(),
                    error = %e,
                    "Job failed"
                );
                self.emit_progress(JobProgress {
                    current: index,
                    total,
                    job_id: job.id.clone(),
                    state: JobState::Failed,
                    message: e.to_string(),
                });
                run_dir.set_preserve(true);
                JobResult::failed(job, &e, state, stats)
            }
        };

        if self.options.keep_run_dirs {
            run_dir.set_preserve(true);
        }
        result.run_dir = run_dir.finish();
        result.elapsed_secs = start.elapsed().as_secs_f64();
        result
    }

    #[allow(clippy::too_many_arguments)]
    async fn execute_phases(
        &self,
        driver: &dyn ClassifierDriver,
        ctx: &RunContext,
        stats: &mut RunStatistics,
        state: &mut JobState,
        job: &JobSpec,
        index: usize,
        total: usize,
    ) -> BenchResult<()> {
        self.transition(state, job, index, total);
        driver.train(ctx, stats).await?;

        self.transition(state, job, index, total);
        let predictions = driver.test(ctx, stats).await?;

        self.transition(state, job, index, total);
        driver.score(ctx, &predictions, stats).await?;

        self.transition(state, job, index, total);
        Ok(())
    }

    fn transition(&self, state: &mut JobState, job: &JobSpec, index: usize, total: usize) {
        *state = state.advance();
        debug!(job_id = %job.id, "Job entered state {}", state);
        self.emit_progress(JobProgress {
            current: index,
            total,
            job_id: job.id.clone(),
            state: *state,
            message: format!("{} {}", job.classifier, state),
        });
    }

    fn check_oversubscription(&self, jobs: &[JobSpec], parallel: usize) {
        let Ok(available) = std::thread::available_parallelism() else {
            return;
        };
        let max_threads = jobs
            .iter()
            .map(|job| job.hyperparameters.num_threads as usize)
            .max()
            .unwrap_or(1);
        let requested = parallel.min(jobs.len().max(1)) * max_threads;

        if requested > available.get() {
            warn!(
                "{} parallel jobs × {} backend threads exceeds {} available cores",
                parallel,
                max_threads,
                available.get()
            );
        }
    }

    /// Emit progress update
    fn emit_progress(&self, progress: JobProgress) {
        if let Some(callback) = &self.progress_callback {
            callback(progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::drivers::{DatasetFiles, Hyperparameters, RangerDriver};

    fn job(classifier: &str) -> JobSpec {
        JobSpec::new(
            classifier,
            "iris",
            DatasetFiles {
                train_data: PathBuf::from("train.csv"),
                train_labels: PathBuf::from("train-labels.csv"),
                test_data: PathBuf::from("test.csv"),
                test_labels: PathBuf::from("test-labels.csv"),
            },
            Hyperparameters::new(5, 1),
        )
    }

    #[test]
    fn test_options_from_config() {
        let config = BenchConfig::empty().with_job_timeout(30).with_max_parallel_jobs(3);
        let options = OrchestratorOptions::from_config(&config);
        assert_eq!(options.job_timeout, Some(Duration::from_secs(30)));
        assert_eq!(options.max_parallel_jobs, 3);
        assert_eq!(options.results_dir, Some(PathBuf::from(".")));
    }

    #[tokio::test]
    async fn test_unknown_classifier_fails_without_run_dir() {
        let work = tempfile::TempDir::new().unwrap();
        let registry = ClassifierRegistry::new();
        let options = OrchestratorOptions {
            work_dir: work.path().to_path_buf(),
            ..Default::default()
        };
        let orchestrator = BenchmarkOrchestrator::new(&registry, options);

        let result = orchestrator.run_job(&job("nonexistent"), 0, 1).await;
        assert_eq!(result.state, JobState::Failed);
        assert_eq!(result.failure_kind(), Some("unknown_classifier"));
        assert_eq!(result.failure.unwrap().phase, JobState::Pending);
        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_backend_fails_in_training() {
        let work = tempfile::TempDir::new().unwrap();
        let mut registry = ClassifierRegistry::new();
        registry
            .register(
                "ranger",
                Arc::new(RangerDriver::new("/nonexistent/ranger", "label")),
            )
            .unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_callback = Arc::clone(&seen);
        let mut orchestrator = BenchmarkOrchestrator::new(
            &registry,
            OrchestratorOptions {
                work_dir: work.path().to_path_buf(),
                ..Default::default()
            },
        );
        orchestrator.set_progress_callback(Box::new(move |progress| {
            seen_by_callback.lock().unwrap().push(progress.state);
        }));

        let results = orchestrator.run_jobs(&[job("ranger")]).await;
        assert_eq!(results.len(), 1);
        let failure = results[0].failure.as_ref().unwrap();
        assert_eq!(failure.kind, "backend_not_found");
        assert_eq!(failure.phase, JobState::Training);
        // Failed run directories are kept for inspection
        assert!(results[0].run_dir.as_ref().unwrap().is_dir());
        assert_eq!(
            *seen.lock().unwrap(),
            vec![JobState::Training, JobState::Failed]
        );
    }
}
