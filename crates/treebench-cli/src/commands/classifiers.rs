//! Classifier listing command

use std::path::Path;

use anyhow::{Context, Result};
use colored::*;
use treebench_core::BenchConfig;

use crate::console::CliConsole;

/// List configured classifiers with their driver, format and backend status
pub async fn list(config_path: &Path) -> Result<()> {
    let console = CliConsole;
    let config = BenchConfig::load(config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    if config.classifiers.is_empty() {
        console.warn("No classifiers configured");
        return Ok(());
    }

    console.print_header("Classifiers");
    println!("{:<20} {:<10} {:<8} {}", "Name", "Driver", "Format", "Status");
    println!("{:-<70}", "");

    for (name, classifier) in &config.classifiers {
        let (format, status) = match classifier.build() {
            Ok(driver) => {
                let status = match driver.validate() {
                    Ok(()) => "ready".green().to_string(),
                    Err(e) => e.to_string().red().to_string(),
                };
                (driver.data_format().to_string(), status)
            }
            Err(e) => ("-".to_string(), e.to_string().red().to_string()),
        };
        println!(
            "{:<20} {:<10} {:<8} {}",
            name,
            classifier.driver_name(),
            format,
            status
        );
    }

    println!("\nTotal: {} classifiers", config.classifiers.len());
    Ok(())
}
