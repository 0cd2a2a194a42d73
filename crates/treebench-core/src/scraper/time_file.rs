//! Timing artifact parsing

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{BenchError, BenchResult};
use crate::stats::{MetricValue, RunStatistics};

/// Metric names recognized in a timing artifact
pub const TIME_FILE_METRICS: &[&str] = &[
    "wall-time",
    "user-time",
    "system-time",
    "cpu-time",
    "max-memory",
];

static METRIC_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z][A-Za-z0-9_-]*)\s*:\s*(\S+)(?:\s+\S+)?\s*$")
        .expect("metric line pattern is valid")
});

/// Read a timing artifact and insert its metrics under `key_prefix`
pub async fn get_statistics_from_time_file(
    path: &Path,
    target: &mut RunStatistics,
    key_prefix: &str,
) -> BenchResult<()> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        BenchError::malformed(
            path.display().to_string(),
            format!("cannot read timing artifact: {}", e),
        )
    })?;

    parse_time_file(&text, &path.display().to_string(), target, key_prefix)
}

/// Parse timing artifact text
///
/// Lines that do not name a recognized metric are ignored.
pub fn parse_time_file(
    text: &str,
    source_name: &str,
    target: &mut RunStatistics,
    key_prefix: &str,
) -> BenchResult<()> {
    for line in text.lines() {
        let Some(captures) = METRIC_LINE.captures(line) else {
            continue;
        };
        let name = &captures[1];
        if !TIME_FILE_METRICS.iter().any(|metric| *metric == name) {
            continue;
        }

        let value = MetricValue::parse(&captures[2]).ok_or_else(|| {
            BenchError::malformed(source_name, format!("invalid metric value in line '{}'", line))
        })?;
        target.insert(format!("{}{}", key_prefix, name), value)?;
    }

    Ok(())
}
