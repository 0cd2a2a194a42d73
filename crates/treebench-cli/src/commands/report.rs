//! Render a saved benchmark summary

use std::path::Path;

use anyhow::{Context, Result};
use treebench_core::{BenchmarkSummary, ReportFormat, generate_report};

/// Print a saved summary in the requested format
pub async fn show(input: &Path, format: &str) -> Result<()> {
    let report_format: ReportFormat = format.parse()?;
    let content = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let summary: BenchmarkSummary = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse summary {}", input.display()))?;

    println!("{}", generate_report(&summary, report_format)?);
    Ok(())
}
