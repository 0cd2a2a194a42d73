//! Driver for the ranger random forest CLI

use std::path::PathBuf;

use async_trait::async_trait;

use super::{ClassifierDriver, Phase, RunContext, execute_phase};
use crate::config::{BenchConfig, ClassifierConfig};
use crate::error::BenchResult;
use crate::formats::DataFormat;
use crate::runner::locate_executable;
use crate::stats::RunStatistics;

const OUTPUT_PREFIX: &str = "ranger";
const PREDICTION_FILE: &str = "ranger_out.prediction";

/// Runs the `ranger` executable on CSV data
///
/// Ranger reads the label from a column of the data file, so the separate
/// training label file is not passed to it. The test label file is still
/// used for scoring.
#[derive(Debug, Clone)]
pub struct RangerDriver {
    executable: PathBuf,
    depvarname: String,
}

impl RangerDriver {
    /// Create a driver; `depvarname` names the label column
    pub fn new(executable: impl Into<PathBuf>, depvarname: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            depvarname: depvarname.into(),
        }
    }

    /// Register a placeholder ranger classifier
    pub fn add_default_config(config: &mut BenchConfig) {
        config.add_classifier(
            "ranger",
            ClassifierConfig::Ranger {
                executable: PathBuf::from("ranger"),
                depvarname: "label".to_string(),
            },
        );
    }
}

#[async_trait]
impl ClassifierDriver for RangerDriver {
    fn driver_name(&self) -> &'static str {
        "ranger"
    }

    fn data_format(&self) -> DataFormat {
        DataFormat::Csv
    }

    fn validate(&self) -> BenchResult<()> {
        locate_executable(&self.executable)?;
        Ok(())
    }

    async fn train(&self, ctx: &RunContext, stats: &mut RunStatistics) -> BenchResult<()> {
        let hp = &ctx.hyperparameters;
        let mut invocation = ctx
            .invocation(&self.executable)
            .arg("--file")
            .arg(ctx.dataset.train_data.display())
            .arg("--depvarname")
            .arg(&self.depvarname)
            .args(["--treetype", "1"])
            .arg("--ntree")
            .arg(hp.num_estimators)
            .args(["--skipoob", "--noreplace", "--fraction", "1"])
            .args(["--outprefix", OUTPUT_PREFIX, "--write"])
            .arg("--nthreads")
            .arg(hp.num_threads);
        if let Some(depth) = hp.max_tree_depth {
            invocation = invocation.arg("--maxdepth").arg(depth);
        }

        execute_phase(invocation.with_log(Some("ranger-train")), Phase::Train, stats).await?;
        Ok(())
    }

    async fn test(&self, ctx: &RunContext, stats: &mut RunStatistics) -> BenchResult<PathBuf> {
        let invocation = ctx
            .invocation(&self.executable)
            .arg("--file")
            .arg(ctx.dataset.test_data.display())
            .arg("--depvarname")
            .arg(&self.depvarname)
            .arg("--predict")
            .arg(format!("{}.forest", OUTPUT_PREFIX))
            .arg("--nthreads")
            .arg(ctx.hyperparameters.num_threads)
            .with_log(Some("ranger-test"));

        execute_phase(invocation, Phase::Test, stats).await?;
        Ok(ctx.run_file(PREDICTION_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranger_reads_csv() {
        let driver = RangerDriver::new("ranger", "label");
        assert_eq!(driver.data_format(), DataFormat::Csv);
        assert_eq!(driver.driver_name(), "ranger");
    }

    #[test]
    fn test_validate_missing_executable() {
        let driver = RangerDriver::new("/nonexistent/bin/ranger", "label");
        assert_eq!(driver.validate().unwrap_err().kind(), "backend_not_found");
    }
}
