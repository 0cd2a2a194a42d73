//! Configuration management commands

use std::path::Path;

use anyhow::{Context, Result, bail};
use treebench_core::{BenchConfig, ClassifierRegistry};

use crate::console::CliConsole;

/// Write a template configuration
pub async fn init(output: &Path, force: bool) -> Result<()> {
    let console = CliConsole;

    if output.exists() && !force {
        bail!(
            "Configuration file already exists: {} (use --force to overwrite)",
            output.display()
        );
    }

    BenchConfig::default_config()
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    console.success(&format!("Created configuration file: {}", output.display()));
    console.info("Fill in the placeholder paths before running the benchmark");
    Ok(())
}

/// Validate a configuration file and every configured backend
pub async fn validate(config_path: &Path) -> Result<()> {
    let console = CliConsole;
    console.print_header("Configuration Validation");

    let config = BenchConfig::load(config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    console.success(&format!("Loaded configuration from: {}", config_path.display()));

    let registry = ClassifierRegistry::from_config(&config)?;
    if let Err(e) = registry.validate() {
        console.error(&e.to_string());
        bail!("Configuration is invalid");
    }

    console.success(&format!(
        "{} classifiers, {} datasets, {} hyperparameter sets",
        registry.len(),
        config.datasets.len(),
        config.hyperparameters.len()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_refuses_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("treebench.toml");

        init(&path, false).await.unwrap();
        assert!(BenchConfig::load(&path).is_ok());
        assert!(init(&path, false).await.is_err());
        assert!(init(&path, true).await.is_ok());
    }
}
