//! Driver for the balsa native binaries

use std::path::PathBuf;

use async_trait::async_trait;

use super::{ClassifierDriver, Phase, RunContext, execute_phase};
use crate::config::{BenchConfig, ClassifierConfig};
use crate::error::{BenchError, BenchResult};
use crate::formats::DataFormat;
use crate::runner::locate_executable;
use crate::stats::RunStatistics;

const TRAIN_BINARY: &str = "balsa_train";
const CLASSIFY_BINARY: &str = "balsa_classify";
const MODEL_FILE: &str = "balsa.model";
const PREDICTION_FILE: &str = "labels.bin";

/// Runs `balsa_train` and `balsa_classify` from a directory of binaries
#[derive(Debug, Clone)]
pub struct BalsaDriver {
    path: PathBuf,
    data_format: DataFormat,
}

impl BalsaDriver {
    /// Create a driver for the binaries in `path`
    ///
    /// Balsa reads either flat binary records or its own tagged format.
    pub fn new(path: impl Into<PathBuf>, data_format: DataFormat) -> BenchResult<Self> {
        if !matches!(data_format, DataFormat::Bin | DataFormat::Balsa) {
            return Err(BenchError::InvalidConfig(format!(
                "Unsupported data format for balsa: '{}'",
                data_format
            )));
        }

        Ok(Self {
            path: path.into(),
            data_format,
        })
    }

    /// Register a placeholder balsa classifier
    pub fn add_default_config(config: &mut BenchConfig) {
        config.add_classifier(
            "balsa",
            ClassifierConfig::Balsa {
                path: PathBuf::from("/path/to/dir/that/contains/balsa/binaries"),
                data_format: DataFormat::Bin,
            },
        );
    }

    fn binary(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

#[async_trait]
impl ClassifierDriver for BalsaDriver {
    fn driver_name(&self) -> &'static str {
        "balsa"
    }

    fn data_format(&self) -> DataFormat {
        self.data_format
    }

    fn validate(&self) -> BenchResult<()> {
        locate_executable(&self.binary(TRAIN_BINARY))?;
        locate_executable(&self.binary(CLASSIFY_BINARY))?;
        Ok(())
    }

    async fn train(&self, ctx: &RunContext, stats: &mut RunStatistics) -> BenchResult<()> {
        let hp = &ctx.hyperparameters;
        let mut invocation = ctx
            .invocation(self.binary(TRAIN_BINARY))
            .args(["-c".to_string(), hp.num_estimators.to_string()])
            .args(["-t".to_string(), hp.num_threads.to_string()]);
        if let Some(depth) = hp.max_tree_depth {
            invocation = invocation.arg("-d").arg(depth);
        }
        let invocation = invocation
            .arg(ctx.dataset.train_data.display())
            .arg(ctx.dataset.train_labels.display())
            .arg(MODEL_FILE)
            .with_log(None);

        execute_phase(invocation, Phase::Train, stats).await?;
        Ok(())
    }

    async fn test(&self, ctx: &RunContext, stats: &mut RunStatistics) -> BenchResult<PathBuf> {
        let threads = ctx.hyperparameters.num_threads;
        let invocation = ctx
            .invocation(self.binary(CLASSIFY_BINARY))
            .arg("-t")
            .arg(threads)
            .arg("-p")
            .arg(threads)
            .arg(MODEL_FILE)
            .arg(ctx.dataset.test_data.display())
            .arg(PREDICTION_FILE)
            .with_log(None);

        execute_phase(invocation, Phase::Test, stats).await?;
        Ok(ctx.run_file(PREDICTION_FILE))
    }
}
