//! Driver for Python train/test script pairs (LightGBM, scikit-learn)

use std::path::PathBuf;

use async_trait::async_trait;

use super::{ClassifierDriver, Phase, RunContext, execute_phase};
use crate::config::{BenchConfig, ClassifierConfig};
use crate::error::{BenchError, BenchResult};
use crate::formats::DataFormat;
use crate::runner::{absolute_path, locate_executable};
use crate::stats::RunStatistics;

const PREDICTION_FILE: &str = "labels.bin";

/// Runs `<name>-train.py` and `<name>-test.py` with a Python interpreter
///
/// Train: `<script> -e <estimators> -t <threads> [-d <depth>] <data> <labels> <model>`
/// Test: `<script> <model> <data> <predictions>`
#[derive(Debug, Clone)]
pub struct PythonScriptDriver {
    name: &'static str,
    python: PathBuf,
    scripts_dir: PathBuf,
}

impl PythonScriptDriver {
    /// LightGBM through its Python package
    pub fn lightgbm(python: impl Into<PathBuf>, scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: "lightgbm",
            python: python.into(),
            scripts_dir: scripts_dir.into(),
        }
    }

    /// scikit-learn's random forest
    pub fn sklearn(python: impl Into<PathBuf>, scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: "sklearn",
            python: python.into(),
            scripts_dir: scripts_dir.into(),
        }
    }

    /// Register a placeholder LightGBM classifier
    pub fn add_default_lightgbm_config(config: &mut BenchConfig) {
        config.add_classifier(
            "lightgbm",
            ClassifierConfig::Lightgbm {
                python: PathBuf::from("/path/to/python/interpreter"),
                scripts_dir: PathBuf::from("/path/to/benchmark/scripts"),
            },
        );
    }

    /// Register a placeholder scikit-learn classifier
    pub fn add_default_sklearn_config(config: &mut BenchConfig) {
        config.add_classifier(
            "sklearn",
            ClassifierConfig::Sklearn {
                python: PathBuf::from("/path/to/python/interpreter"),
                scripts_dir: PathBuf::from("/path/to/benchmark/scripts"),
            },
        );
    }

    fn script(&self, phase: Phase) -> PathBuf {
        let suffix = match phase {
            Phase::Train => "train",
            Phase::Test => "test",
        };
        self.scripts_dir.join(format!("{}-{}.py", self.name, suffix))
    }

    fn model_file(&self) -> String {
        format!("{}.model", self.name)
    }

    fn log_prefix(&self, phase: Phase) -> String {
        match phase {
            Phase::Train => format!("{}-train", self.name),
            Phase::Test => format!("{}-test", self.name),
        }
    }
}

#[async_trait]
impl ClassifierDriver for PythonScriptDriver {
    fn driver_name(&self) -> &'static str {
        self.name
    }

    fn data_format(&self) -> DataFormat {
        DataFormat::Bin
    }

    fn validate(&self) -> BenchResult<()> {
        locate_executable(&self.python)?;
        for phase in [Phase::Train, Phase::Test] {
            let script = self.script(phase);
            if !script.is_file() {
                return Err(BenchError::BackendNotFound { path: script });
            }
        }
        Ok(())
    }

    async fn train(&self, ctx: &RunContext, stats: &mut RunStatistics) -> BenchResult<()> {
        let hp = &ctx.hyperparameters;
        let mut invocation = ctx
            .invocation(&self.python)
            .arg(absolute_path(&self.script(Phase::Train))?.display())
            .arg("-e")
            .arg(hp.num_estimators)
            .arg("-t")
            .arg(hp.num_threads);
        if let Some(depth) = hp.max_tree_depth {
            invocation = invocation.arg("-d").arg(depth);
        }
        let invocation = invocation
            .arg(ctx.dataset.train_data.display())
            .arg(ctx.dataset.train_labels.display())
            .arg(self.model_file())
            .with_log(Some(&self.log_prefix(Phase::Train)));

        execute_phase(invocation, Phase::Train, stats).await?;
        Ok(())
    }

    async fn test(&self, ctx: &RunContext, stats: &mut RunStatistics) -> BenchResult<PathBuf> {
        let invocation = ctx
            .invocation(&self.python)
            .arg(absolute_path(&self.script(Phase::Test))?.display())
            .arg(self.model_file())
            .arg(ctx.dataset.test_data.display())
            .arg(PREDICTION_FILE)
            .with_log(Some(&self.log_prefix(Phase::Test)));

        execute_phase(invocation, Phase::Test, stats).await?;
        Ok(ctx.run_file(PREDICTION_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_paths() {
        let driver = PythonScriptDriver::lightgbm("/usr/bin/python3", "/opt/scripts");
        assert_eq!(
            driver.script(Phase::Train),
            PathBuf::from("/opt/scripts/lightgbm-train.py")
        );
        assert_eq!(
            driver.script(Phase::Test),
            PathBuf::from("/opt/scripts/lightgbm-test.py")
        );
        assert_eq!(driver.model_file(), "lightgbm.model");
    }

    #[test]
    fn test_sklearn_uses_bin_format() {
        let driver = PythonScriptDriver::sklearn("python3", "/opt/scripts");
        assert_eq!(driver.driver_name(), "sklearn");
        assert_eq!(driver.data_format(), DataFormat::Bin);
    }

    #[test]
    fn test_validate_requires_scripts() {
        let dir = tempfile::TempDir::new().unwrap();
        let driver = PythonScriptDriver::sklearn("/bin/sh", dir.path());
        let err = driver.validate().unwrap_err();
        match err {
            BenchError::BackendNotFound { path } => {
                assert!(path.ends_with("sklearn-train.py"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
