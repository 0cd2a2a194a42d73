//! Resource usage of a finished backend process and the timing artifact

use std::path::Path;
use std::time::Duration;

use crate::error::{BenchError, BenchResult};

/// Resource usage recorded for one process invocation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceUsage {
    /// Wall-clock time from spawn to exit
    pub wall_time: Duration,
    /// User CPU time of the child
    pub user_time: Duration,
    /// System CPU time of the child
    pub system_time: Duration,
    /// Peak resident set size in KiB
    pub max_memory_kib: u64,
}

impl ResourceUsage {
    /// Total CPU time (user + system)
    pub fn cpu_time(&self) -> Duration {
        self.user_time + self.system_time
    }

    /// Render the timing artifact, one `<name>: <number> <unit>` line per metric
    pub fn to_time_file(&self) -> String {
        format!(
            "wall-time: {:.6} s\nuser-time: {:.6} s\nsystem-time: {:.6} s\ncpu-time: {:.6} s\nmax-memory: {} KiB\n",
            self.wall_time.as_secs_f64(),
            self.user_time.as_secs_f64(),
            self.system_time.as_secs_f64(),
            self.cpu_time().as_secs_f64(),
            self.max_memory_kib
        )
    }

    /// Write the timing artifact to `path`
    pub async fn write_time_file(&self, path: &Path) -> BenchResult<()> {
        tokio::fs::write(path, self.to_time_file())
            .await
            .map_err(|e| BenchError::io(format!("Failed to write time file {:?}", path), e))?;
        tracing::debug!("Wrote time file: {:?}", path);
        Ok(())
    }
}

#[cfg(unix)]
pub(super) fn from_rusage(wall_time: Duration, rusage: &libc::rusage) -> ResourceUsage {
    fn timeval(tv: libc::timeval) -> Duration {
        Duration::from_secs(tv.tv_sec.max(0) as u64) + Duration::from_micros(tv.tv_usec.max(0) as u64)
    }

    // ru_maxrss is reported in bytes on macOS and KiB elsewhere
    #[cfg(target_os = "macos")]
    let max_memory_kib = rusage.ru_maxrss.max(0) as u64 / 1024;
    #[cfg(not(target_os = "macos"))]
    let max_memory_kib = rusage.ru_maxrss.max(0) as u64;

    ResourceUsage {
        wall_time,
        user_time: timeval(rusage.ru_utime),
        system_time: timeval(rusage.ru_stime),
        max_memory_kib,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::get_statistics_from_time_file;
    use crate::stats::{MetricValue, RunStatistics};

    #[test]
    fn test_time_file_format() {
        let usage = ResourceUsage {
            wall_time: Duration::from_millis(1500),
            user_time: Duration::from_millis(1000),
            system_time: Duration::from_millis(200),
            max_memory_kib: 2048,
        };
        let text = usage.to_time_file();
        assert!(text.contains("wall-time: 1.500000 s\n"));
        assert!(text.contains("cpu-time: 1.200000 s\n"));
        assert!(text.ends_with("max-memory: 2048 KiB\n"));
    }

    #[tokio::test]
    async fn test_written_time_file_is_scrapable() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("train.time");
        let usage = ResourceUsage {
            wall_time: Duration::from_secs(2),
            max_memory_kib: 512,
            ..Default::default()
        };
        usage.write_time_file(&path).await.unwrap();

        let mut stats = RunStatistics::new();
        get_statistics_from_time_file(&path, &mut stats, "train-").await.unwrap();
        assert_eq!(stats.get_f64("train-wall-time"), Some(2.0));
        assert_eq!(stats.get("train-max-memory"), Some(MetricValue::Integer(512)));
    }
}
