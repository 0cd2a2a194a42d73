//! Tag-based statistics extraction from backend stdout

use std::collections::BTreeMap;

use crate::error::{BenchError, BenchResult};
use crate::stats::{MetricValue, RunStatistics};

/// A recognized stdout tag and the statistic it feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdoutRule {
    /// Substring identifying a recognized line
    pub tag: &'static str,
    /// Statistic name (before prefixing)
    pub key: &'static str,
}

/// Model-structure tags, the only rules applied to training output
pub const MODEL_STDOUT_RULES: &[StdoutRule] = &[
    StdoutRule {
        tag: "max-tree-depth",
        key: "depth",
    },
    StdoutRule {
        tag: "max-node-count",
        key: "node-count",
    },
    StdoutRule {
        tag: "node-count",
        key: "node-count",
    },
    StdoutRule {
        tag: "tree-count",
        key: "tree-count",
    },
];

/// Rules applied by [`get_statistics_from_stdout`], first match per line wins
///
/// Adds the backend-reported accuracy to [`MODEL_STDOUT_RULES`].
pub const DEFAULT_STDOUT_RULES: &[StdoutRule] = &[
    StdoutRule {
        tag: "max-tree-depth",
        key: "depth",
    },
    StdoutRule {
        tag: "max-node-count",
        key: "node-count",
    },
    StdoutRule {
        tag: "node-count",
        key: "node-count",
    },
    StdoutRule {
        tag: "tree-count",
        key: "tree-count",
    },
    // Backend-reported accuracy, kept apart from the scorer's own value
    StdoutRule {
        tag: "accuracy",
        key: "reported-accuracy",
    },
];

/// Scan stdout with the default rule table
pub fn get_statistics_from_stdout(
    text: &str,
    target: &mut RunStatistics,
    key_prefix: &str,
) -> BenchResult<()> {
    scrape_stdout_with_rules(text, DEFAULT_STDOUT_RULES, target, key_prefix)
}

/// Scan stdout with a custom rule table
///
/// The trailing whitespace-separated token of each recognized line is the
/// value. When a tag repeats, its last occurrence wins.
pub fn scrape_stdout_with_rules(
    text: &str,
    rules: &[StdoutRule],
    target: &mut RunStatistics,
    key_prefix: &str,
) -> BenchResult<()> {
    let mut found: BTreeMap<&str, MetricValue> = BTreeMap::new();

    for line in text.lines() {
        let Some(rule) = rules.iter().find(|rule| line.contains(rule.tag)) else {
            continue;
        };

        let token = line.split_whitespace().last().unwrap_or_default();
        let value = MetricValue::parse(token).ok_or_else(|| {
            BenchError::malformed("stdout", format!("no numeric value in line '{}'", line.trim()))
        })?;
        found.insert(rule.key, value);
    }

    for (key, value) in found {
        target.insert(format!("{}{}", key_prefix, key), value)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_tagged_values() {
        let mut stats = RunStatistics::new();
        get_statistics_from_stdout("max-tree-depth 5\nmax-node-count: 311\n", &mut stats, "train-")
            .unwrap();
        assert_eq!(stats.get("train-depth"), Some(MetricValue::Integer(5)));
        assert_eq!(stats.get("train-node-count"), Some(MetricValue::Integer(311)));
    }

    #[test]
    fn test_unrelated_lines_do_not_change_values() {
        let base = "Training...\nmax-tree-depth 7\n";
        let noisy = format!("{}Done (3.2 seconds).\nrandom chatter 99\n\n", base);

        let mut plain = RunStatistics::new();
        let mut with_noise = RunStatistics::new();
        get_statistics_from_stdout(base, &mut plain, "train-").unwrap();
        get_statistics_from_stdout(&noisy, &mut with_noise, "train-").unwrap();
        assert_eq!(plain, with_noise);
    }

    #[test]
    fn test_model_rules_ignore_accuracy_chatter() {
        let mut stats = RunStatistics::new();
        scrape_stdout_with_rules(
            "Computing accuracy...\nmax-tree-depth 6\n",
            MODEL_STDOUT_RULES,
            &mut stats,
            "train-",
        )
        .unwrap();
        assert_eq!(stats.get("train-depth"), Some(MetricValue::Integer(6)));
        assert!(!stats.contains_key("train-reported-accuracy"));
    }

    #[test]
    fn test_reported_accuracy_is_float() {
        let mut stats = RunStatistics::new();
        get_statistics_from_stdout("test accuracy 0.9375", &mut stats, "test-").unwrap();
        assert_eq!(
            stats.get("test-reported-accuracy"),
            Some(MetricValue::Float(0.9375))
        );
    }

    #[test]
    fn test_recognized_tag_without_number_is_malformed() {
        let mut stats = RunStatistics::new();
        let err = get_statistics_from_stdout("max-tree-depth unknown", &mut stats, "")
            .unwrap_err();
        assert_eq!(err.kind(), "malformed_output");
        assert!(err.to_string().contains("max-tree-depth unknown"));
    }

    #[test]
    fn test_last_occurrence_wins() {
        let mut stats = RunStatistics::new();
        get_statistics_from_stdout("max-tree-depth 3\nmax-tree-depth 9\n", &mut stats, "").unwrap();
        assert_eq!(stats.get("depth"), Some(MetricValue::Integer(9)));
    }

    #[test]
    fn test_custom_rules() {
        const RULES: &[StdoutRule] = &[StdoutRule {
            tag: "leaves",
            key: "leaf-count",
        }];
        let mut stats = RunStatistics::new();
        scrape_stdout_with_rules("leaves = 40\nmax-tree-depth 2", RULES, &mut stats, "train-")
            .unwrap();
        assert_eq!(stats.get("train-leaf-count"), Some(MetricValue::Integer(40)));
        assert!(!stats.contains_key("train-depth"));
    }
}
