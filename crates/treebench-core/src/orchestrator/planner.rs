//! Job planning
//!
//! Expands classifiers × datasets × hyperparameters into job specs. Every
//! name is resolved here, so planning errors surface before anything runs.

use tracing::debug;

use super::JobSpec;
use crate::config::{BenchConfig, DatasetConfig};
use crate::error::{BenchError, BenchResult};
use crate::registry::ClassifierRegistry;

/// Plan the jobs of a benchmark run
///
/// Empty filters select every registered classifier and every dataset.
pub fn plan_jobs(
    config: &BenchConfig,
    registry: &ClassifierRegistry,
    classifier_filter: &[String],
    dataset_filter: &[String],
) -> BenchResult<Vec<JobSpec>> {
    let classifiers: Vec<&str> = if classifier_filter.is_empty() {
        registry.names()
    } else {
        classifier_filter.iter().map(String::as_str).collect()
    };

    let datasets: Vec<&DatasetConfig> = if dataset_filter.is_empty() {
        config.datasets.iter().collect()
    } else {
        dataset_filter
            .iter()
            .map(|name| {
                config.dataset(name).ok_or_else(|| {
                    BenchError::InvalidConfig(format!("unknown dataset '{}'", name))
                })
            })
            .collect::<BenchResult<_>>()?
    };

    let mut jobs = Vec::new();
    for name in classifiers {
        let classifier = registry.get(name)?;
        for dataset in &datasets {
            let files = dataset.files_for(classifier.data_format).ok_or_else(|| {
                BenchError::InvalidConfig(format!(
                    "dataset '{}' has no '{}' files required by classifier '{}'",
                    dataset.name, classifier.data_format, name
                ))
            })?;
            // Backends run inside their own run directory
            let files = files.absolutize()?;

            for hyperparameters in &config.hyperparameters {
                jobs.push(JobSpec::new(
                    name,
                    &dataset.name,
                    files.clone(),
                    *hyperparameters,
                ));
            }
        }
    }

    debug!("Planned {} jobs", jobs.len());
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use super::*;
    use crate::drivers::{DatasetFiles, Hyperparameters, PythonScriptDriver, RangerDriver};
    use crate::formats::DataFormat;

    fn files(ext: &str) -> DatasetFiles {
        DatasetFiles {
            train_data: PathBuf::from(format!("train.{}", ext)),
            train_labels: PathBuf::from(format!("train-labels.{}", ext)),
            test_data: PathBuf::from(format!("test.{}", ext)),
            test_labels: PathBuf::from(format!("test-labels.{}", ext)),
        }
    }

    fn setup() -> (BenchConfig, ClassifierRegistry) {
        let config = BenchConfig::empty()
            .with_dataset(
                DatasetConfig::new("iris")
                    .with_files(DataFormat::Bin, files("bin"))
                    .with_files(DataFormat::Csv, files("csv")),
            )
            .with_dataset(DatasetConfig::new("higgs").with_files(DataFormat::Bin, files("bin")))
            .with_hyperparameters(vec![
                Hyperparameters::new(10, 1),
                Hyperparameters::new(10, 1).with_max_tree_depth(4),
            ]);

        let mut registry = ClassifierRegistry::new();
        registry
            .register("ranger", Arc::new(RangerDriver::new("ranger", "label")))
            .unwrap();
        registry
            .register(
                "sklearn",
                Arc::new(PythonScriptDriver::sklearn("python3", "/opt/scripts")),
            )
            .unwrap();
        (config, registry)
    }

    #[test]
    fn test_plan_selects_native_format_files() {
        let (config, registry) = setup();
        let jobs = plan_jobs(&config, &registry, &["ranger".to_string()], &["iris".to_string()])
            .unwrap();
        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|j| j.files.test_labels.ends_with("test-labels.csv")));
        assert_eq!(jobs[1].id, "ranger-iris-e10-d4-t1");
    }

    #[test]
    fn test_plan_resolves_relative_dataset_paths() {
        let (config, registry) = setup();
        let jobs = plan_jobs(&config, &registry, &["sklearn".to_string()], &["higgs".to_string()])
            .unwrap();
        let cwd = std::env::current_dir().unwrap();
        let files = &jobs[0].files;
        assert_eq!(files.train_data, cwd.join("train.bin"));
        assert!(files.test_labels.is_absolute());
    }

    #[test]
    fn test_plan_unknown_classifier() {
        let (config, registry) = setup();
        let err = plan_jobs(&config, &registry, &["nonexistent".to_string()], &[]).unwrap_err();
        assert!(matches!(err, BenchError::UnknownClassifier(_)));
    }

    #[test]
    fn test_plan_missing_format() {
        let (config, registry) = setup();
        // higgs only ships bin files
        let err = plan_jobs(&config, &registry, &["ranger".to_string()], &[]).unwrap_err();
        assert_eq!(err.kind(), "invalid_config");
    }

    #[test]
    fn test_plan_unknown_dataset() {
        let (config, registry) = setup();
        let err = plan_jobs(&config, &registry, &[], &["cifar".to_string()]).unwrap_err();
        assert!(err.to_string().contains("cifar"));
    }

    #[test]
    fn test_plan_sklearn_all_datasets() {
        let (config, registry) = setup();
        let jobs = plan_jobs(&config, &registry, &["sklearn".to_string()], &[]).unwrap();
        assert_eq!(jobs.len(), 4);
    }
}
