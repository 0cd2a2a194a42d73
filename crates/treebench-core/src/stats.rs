//! Run statistics accumulated over a single benchmark job

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, BenchResult};

/// Numeric value of a single statistic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Integral value, e.g. a node count
    Integer(i64),
    /// Floating point value, e.g. a wall time in seconds
    Float(f64),
    /// Explicitly undefined value, e.g. accuracy over zero examples
    Undefined,
}

impl MetricValue {
    /// Parse a numeric token, keeping integers integral
    pub fn parse(token: &str) -> Option<Self> {
        if let Ok(value) = token.parse::<i64>() {
            return Some(MetricValue::Integer(value));
        }
        match token.parse::<f64>() {
            Ok(value) if value.is_finite() => Some(MetricValue::Float(value)),
            _ => None,
        }
    }

    /// Value as a float, if defined
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Integer(v) => Some(*v as f64),
            MetricValue::Float(v) => Some(*v),
            MetricValue::Undefined => None,
        }
    }

    /// Whether the value is defined
    pub fn is_defined(&self) -> bool {
        !matches!(self, MetricValue::Undefined)
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Integer(v) => write!(f, "{}", v),
            MetricValue::Float(v) => write!(f, "{}", v),
            MetricValue::Undefined => write!(f, "undefined"),
        }
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        MetricValue::Integer(value)
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Float(value)
    }
}

/// Ordered mapping from prefixed metric name to value
///
/// A key may be written more than once only with an identical value, so
/// a later writer can never silently replace a statistic recorded with
/// different semantics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunStatistics {
    values: BTreeMap<String, MetricValue>,
}

impl RunStatistics {
    /// Create an empty statistics record
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a statistic, rejecting conflicting rewrites
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetricValue>) -> BenchResult<()> {
        let key = key.into();
        let value = value.into();

        if let Some(existing) = self.values.get(&key) {
            if *existing == value {
                return Ok(());
            }
            return Err(BenchError::StatisticConflict {
                key,
                existing: existing.to_string(),
                incoming: value.to_string(),
            });
        }

        self.values.insert(key, value);
        Ok(())
    }

    /// Merge every entry of another record into this one
    pub fn merge(&mut self, other: RunStatistics) -> BenchResult<()> {
        for (key, value) in other.values {
            self.insert(key, value)?;
        }
        Ok(())
    }

    /// Get a statistic by full key
    pub fn get(&self, key: &str) -> Option<MetricValue> {
        self.values.get(key).copied()
    }

    /// Get a statistic as a float
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.as_f64())
    }

    /// Check whether a key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate over all statistics in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of statistics
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no statistic has been recorded
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, MetricValue)> for RunStatistics {
    fn from_iter<I: IntoIterator<Item = (String, MetricValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers() {
        assert_eq!(MetricValue::parse("5"), Some(MetricValue::Integer(5)));
        assert_eq!(MetricValue::parse("-3"), Some(MetricValue::Integer(-3)));
        assert_eq!(MetricValue::parse("1.5"), Some(MetricValue::Float(1.5)));
        assert_eq!(MetricValue::parse("2e3"), Some(MetricValue::Float(2000.0)));
        assert_eq!(MetricValue::parse("seconds"), None);
        assert_eq!(MetricValue::parse("NaN"), None);
    }

    #[test]
    fn test_insert_same_value_is_allowed() {
        let mut stats = RunStatistics::new();
        stats.insert("train-wall-time", 1.5).unwrap();
        stats.insert("train-wall-time", 1.5).unwrap();
        assert_eq!(stats.len(), 1);
    }

    #[test]
    fn test_insert_conflict_is_rejected() {
        let mut stats = RunStatistics::new();
        stats.insert("test-accuracy", 0.75).unwrap();
        let err = stats.insert("test-accuracy", 0.5).unwrap_err();
        assert_eq!(err.kind(), "statistic_conflict");
        assert_eq!(stats.get_f64("test-accuracy"), Some(0.75));
    }

    #[test]
    fn test_undefined_serializes_as_null() {
        let mut stats = RunStatistics::new();
        stats.insert("test-accuracy", MetricValue::Undefined).unwrap();
        stats.insert("test-example-count", 0i64).unwrap();
        let json = serde_json::to_string(&stats).unwrap();
        assert_eq!(json, r#"{"test-accuracy":null,"test-example-count":0}"#);
    }
}
