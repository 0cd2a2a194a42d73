//! Benchmark configuration
//!
//! Describes the classifiers to compare, the datasets to run them on and the
//! hyperparameter grid, plus run options for the orchestrator.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::drivers::{
    BalsaDriver, ClassifierDriver, DatasetFiles, Hyperparameters, PythonScriptDriver, RangerDriver,
};
use crate::error::{BenchError, BenchResult};
use crate::formats::DataFormat;
use crate::registry::DRIVER_KINDS;

/// Backend-specific configuration of one classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "driver", rename_all = "snake_case")]
pub enum ClassifierConfig {
    /// Native balsa binaries
    Balsa {
        /// Directory containing `balsa_train` and `balsa_classify`
        path: PathBuf,
        #[serde(default = "default_balsa_format")]
        data_format: DataFormat,
    },

    /// LightGBM through Python scripts
    Lightgbm { python: PathBuf, scripts_dir: PathBuf },

    /// scikit-learn through Python scripts
    Sklearn { python: PathBuf, scripts_dir: PathBuf },

    /// The ranger CLI
    Ranger {
        #[serde(default = "default_ranger_executable")]
        executable: PathBuf,
        #[serde(default = "default_depvarname")]
        depvarname: String,
    },
}

fn default_balsa_format() -> DataFormat {
    DataFormat::Bin
}

fn default_ranger_executable() -> PathBuf {
    PathBuf::from("ranger")
}

fn default_depvarname() -> String {
    "label".to_string()
}

impl ClassifierConfig {
    /// Driver type name of this entry
    pub fn driver_name(&self) -> &'static str {
        match self {
            ClassifierConfig::Balsa { .. } => "balsa",
            ClassifierConfig::Lightgbm { .. } => "lightgbm",
            ClassifierConfig::Sklearn { .. } => "sklearn",
            ClassifierConfig::Ranger { .. } => "ranger",
        }
    }

    /// Instantiate the driver described by this entry
    pub fn build(&self) -> BenchResult<Arc<dyn ClassifierDriver>> {
        let driver: Arc<dyn ClassifierDriver> = match self {
            ClassifierConfig::Balsa { path, data_format } => {
                Arc::new(BalsaDriver::new(path, *data_format)?)
            }
            ClassifierConfig::Lightgbm {
                python,
                scripts_dir,
            } => Arc::new(PythonScriptDriver::lightgbm(python, scripts_dir)),
            ClassifierConfig::Sklearn {
                python,
                scripts_dir,
            } => Arc::new(PythonScriptDriver::sklearn(python, scripts_dir)),
            ClassifierConfig::Ranger {
                executable,
                depvarname,
            } => Arc::new(RangerDriver::new(executable, depvarname.clone())),
        };
        Ok(driver)
    }
}

/// A dataset available in one or more native formats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Dataset identifier used in job ids and reports
    pub name: String,

    /// Files per native format
    pub files: BTreeMap<DataFormat, DatasetFiles>,
}

impl DatasetConfig {
    /// Create a dataset with no files yet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: BTreeMap::new(),
        }
    }

    /// Add the files for one format
    pub fn with_files(mut self, format: DataFormat, files: DatasetFiles) -> Self {
        self.files.insert(format, files);
        self
    }

    /// Files in `format`, if the dataset provides them
    pub fn files_for(&self, format: DataFormat) -> Option<&DatasetFiles> {
        self.files.get(&format)
    }
}

/// Complete benchmark configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Classifier name to backend configuration
    #[serde(default)]
    pub classifiers: BTreeMap<String, ClassifierConfig>,

    /// Datasets to benchmark on
    #[serde(default)]
    pub datasets: Vec<DatasetConfig>,

    /// Hyperparameter grid; every classifier runs every entry
    #[serde(default = "default_hyperparameters")]
    pub hyperparameters: Vec<Hyperparameters>,

    /// Directory holding per-job run directories
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Number of jobs run concurrently
    #[serde(default = "default_max_parallel_jobs")]
    pub max_parallel_jobs: usize,

    /// Per-job timeout in seconds (None = no timeout)
    #[serde(default)]
    pub job_timeout_secs: Option<u64>,

    /// Keep run directories of successful jobs
    #[serde(default)]
    pub keep_run_dirs: bool,

    /// Whether to save the summary as JSON
    #[serde(default = "default_save_results")]
    pub save_results: bool,

    /// Output directory for saved results
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

fn default_hyperparameters() -> Vec<Hyperparameters> {
    vec![Hyperparameters::default()]
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("treebench-runs")
}

fn default_max_parallel_jobs() -> usize {
    1
}

fn default_save_results() -> bool {
    true
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self::empty()
    }
}

impl BenchConfig {
    /// Configuration with no classifiers or datasets
    pub fn empty() -> Self {
        Self {
            classifiers: BTreeMap::new(),
            datasets: Vec::new(),
            hyperparameters: default_hyperparameters(),
            work_dir: default_work_dir(),
            max_parallel_jobs: default_max_parallel_jobs(),
            job_timeout_secs: None,
            keep_run_dirs: false,
            save_results: default_save_results(),
            output_dir: None,
        }
    }

    /// Template listing a placeholder entry for every driver type
    pub fn default_config() -> Self {
        let mut config = Self::empty();
        for (_, add_default) in DRIVER_KINDS {
            add_default(&mut config);
        }

        let placeholder = |ext: &str| DatasetFiles {
            train_data: PathBuf::from(format!("/path/to/train-data.{}", ext)),
            train_labels: PathBuf::from(format!("/path/to/train-labels.{}", ext)),
            test_data: PathBuf::from(format!("/path/to/test-data.{}", ext)),
            test_labels: PathBuf::from(format!("/path/to/test-labels.{}", ext)),
        };
        config.datasets.push(
            DatasetConfig::new("example")
                .with_files(DataFormat::Bin, placeholder("bin"))
                .with_files(DataFormat::Csv, placeholder("csv")),
        );

        config
    }

    /// Add or replace a classifier entry
    pub fn add_classifier(&mut self, name: impl Into<String>, classifier: ClassifierConfig) {
        self.classifiers.insert(name.into(), classifier);
    }

    /// Add a dataset
    pub fn with_dataset(mut self, dataset: DatasetConfig) -> Self {
        self.datasets.push(dataset);
        self
    }

    /// Replace the hyperparameter grid
    pub fn with_hyperparameters(mut self, grid: Vec<Hyperparameters>) -> Self {
        self.hyperparameters = grid;
        self
    }

    /// Set the work directory
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    /// Set the number of concurrent jobs
    pub fn with_max_parallel_jobs(mut self, jobs: usize) -> Self {
        self.max_parallel_jobs = jobs;
        self
    }

    /// Set the per-job timeout
    pub fn with_job_timeout(mut self, secs: u64) -> Self {
        self.job_timeout_secs = Some(secs);
        self
    }

    /// Per-job timeout as a duration
    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_secs.map(Duration::from_secs)
    }

    /// Find a dataset by name
    pub fn dataset(&self, name: &str) -> Option<&DatasetConfig> {
        self.datasets.iter().find(|d| d.name == name)
    }

    /// Check structural consistency, independent of the filesystem
    pub fn validate(&self) -> BenchResult<()> {
        if self.max_parallel_jobs == 0 {
            return Err(BenchError::InvalidConfig(
                "max_parallel_jobs must be at least 1".to_string(),
            ));
        }
        if self.hyperparameters.is_empty() {
            return Err(BenchError::InvalidConfig(
                "at least one hyperparameter set is required".to_string(),
            ));
        }
        if let Some(hp) = self
            .hyperparameters
            .iter()
            .find(|hp| hp.num_estimators == 0 || hp.num_threads == 0)
        {
            return Err(BenchError::InvalidConfig(format!(
                "num_estimators and num_threads must be positive ({})",
                hp.label()
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for dataset in &self.datasets {
            if !seen.insert(dataset.name.as_str()) {
                return Err(BenchError::InvalidConfig(format!(
                    "duplicate dataset name '{}'",
                    dataset.name
                )));
            }
        }

        Ok(())
    }

    /// Load a configuration file (JSON, TOML or YAML by extension)
    pub fn load(path: &Path) -> BenchResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BenchError::io(format!("Failed to read config file {:?}", path), e))?;

        let parse_error = |format: &str, e: &dyn std::fmt::Display| {
            BenchError::InvalidConfig(format!(
                "Failed to parse {} config '{}': {}",
                format,
                path.display(),
                e
            ))
        };

        let config: BenchConfig = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => toml::from_str(&content).map_err(|e| parse_error("TOML", &e))?,
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&content).map_err(|e| parse_error("YAML", &e))?
            }
            _ => serde_json::from_str(&content).map_err(|e| parse_error("JSON", &e))?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Write the configuration (format chosen by extension)
    pub fn save(&self, path: &Path) -> BenchResult<()> {
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => toml::to_string_pretty(self)
                .map_err(|e| BenchError::InvalidConfig(format!("Failed to encode TOML: {}", e)))?,
            Some("yaml") | Some("yml") => serde_yaml::to_string(self)
                .map_err(|e| BenchError::InvalidConfig(format!("Failed to encode YAML: {}", e)))?,
            _ => serde_json::to_string_pretty(self)
                .map_err(|e| BenchError::InvalidConfig(format!("Failed to encode JSON: {}", e)))?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| BenchError::io(format!("Failed to create {:?}", parent), e))?;
        }
        std::fs::write(path, content)
            .map_err(|e| BenchError::io(format!("Failed to write config file {:?}", path), e))
    }
}
