//! Output scraping
//!
//! Turns timing artifacts and backend stdout into prefixed statistics.

mod stdout;
mod time_file;

pub use stdout::{
    DEFAULT_STDOUT_RULES, MODEL_STDOUT_RULES, StdoutRule, get_statistics_from_stdout,
    scrape_stdout_with_rules,
};
pub use time_file::{TIME_FILE_METRICS, get_statistics_from_time_file, parse_time_file};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{MetricValue, RunStatistics};

    #[test]
    fn test_train_phase_scenario() {
        let mut stats = RunStatistics::new();
        parse_time_file("wall-time: 1.5 s\ncpu-time: 1.2 s\n", "train.time", &mut stats, "train-")
            .unwrap();
        get_statistics_from_stdout("max-tree-depth 5", &mut stats, "train-").unwrap();

        let expected: RunStatistics = [
            ("train-wall-time".to_string(), MetricValue::Float(1.5)),
            ("train-cpu-time".to_string(), MetricValue::Float(1.2)),
            ("train-depth".to_string(), MetricValue::Integer(5)),
        ]
        .into_iter()
        .collect();
        assert_eq!(stats, expected);
    }
}
