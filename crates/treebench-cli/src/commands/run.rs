//! Benchmark run command

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use treebench_core::{
    BenchConfig, BenchmarkOrchestrator, ClassifierRegistry, OrchestratorOptions, ReportFormat,
    generate_report, plan_jobs,
};

use crate::console::{CliConsole, job_progress_bar, update_progress_bar};

/// Run the configured benchmark
pub async fn run(
    config_path: &Path,
    classifiers: Vec<String>,
    datasets: Vec<String>,
    jobs: Option<usize>,
    timeout: Option<u64>,
    format: &str,
    output: Option<PathBuf>,
    no_save: bool,
    keep_run_dirs: bool,
) -> Result<()> {
    let console = CliConsole;
    let report_format: ReportFormat = format.parse()?;

    let mut config = BenchConfig::load(config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    if let Some(jobs) = jobs {
        config.max_parallel_jobs = jobs;
    }
    if let Some(timeout) = timeout {
        config.job_timeout_secs = Some(timeout);
    }
    if output.is_some() {
        config.output_dir = output;
    }
    if no_save {
        config.save_results = false;
    }
    config.keep_run_dirs |= keep_run_dirs;
    config.validate()?;

    // Unselected classifiers are never validated
    if !classifiers.is_empty() {
        config.classifiers.retain(|name, _| classifiers.contains(name));
    }

    let registry = ClassifierRegistry::from_config(&config)?;
    let planned = plan_jobs(&config, &registry, &classifiers, &datasets)?;
    registry.validate()?;
    let registry = registry.install()?;

    if planned.is_empty() {
        console.warn("No jobs to run: configure at least one classifier and dataset");
        return Ok(());
    }

    console.info(&format!(
        "Running {} jobs ({} in parallel)",
        planned.len(),
        config.max_parallel_jobs
    ));

    let bar = Arc::new(job_progress_bar(planned.len()));
    let mut orchestrator =
        BenchmarkOrchestrator::new(registry, OrchestratorOptions::from_config(&config));
    let progress_bar = Arc::clone(&bar);
    orchestrator.set_progress_callback(Box::new(move |progress| {
        update_progress_bar(&progress_bar, &progress);
    }));

    let summary = orchestrator.run_all(planned).await?;
    bar.finish_and_clear();

    println!("{}", generate_report(&summary, report_format)?);

    if summary.failed_jobs == 0 {
        console.success(&format!(
            "Benchmark complete: {}/{} jobs completed",
            summary.completed_jobs, summary.total_jobs
        ));
    } else {
        console.warn(&format!(
            "Benchmark complete: {}/{} jobs completed, {} failed",
            summary.completed_jobs, summary.total_jobs, summary.failed_jobs
        ));
    }

    Ok(())
}
