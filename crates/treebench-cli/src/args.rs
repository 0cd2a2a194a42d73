//! CLI argument definitions using clap
//!
//! - treebench run                # Run the configured benchmark
//! - treebench classifiers        # List classifiers and backend status
//! - treebench config init        # Write a template configuration
//! - treebench report <file>      # Render a saved summary

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default configuration file name used across all CLI commands.
pub const DEFAULT_CONFIG_FILE: &str = "treebench.toml";

#[derive(Parser, Debug)]
#[command(name = "treebench")]
#[command(about = "Benchmark tree-ensemble classifiers across backends")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run benchmark jobs
    Run {
        /// Path to configuration file
        #[arg(long, short = 'c', default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Only run these classifiers (repeatable)
        #[arg(long = "classifier")]
        classifiers: Vec<String>,

        /// Only run on these datasets (repeatable)
        #[arg(long = "dataset")]
        datasets: Vec<String>,

        /// Number of jobs to run concurrently
        #[arg(long, short = 'j')]
        jobs: Option<usize>,

        /// Per-job timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Report format: table, markdown, json
        #[arg(long, short = 'f', default_value = "table")]
        format: String,

        /// Directory for the saved JSON summary
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Don't save the JSON summary
        #[arg(long)]
        no_save: bool,

        /// Keep run directories of completed jobs
        #[arg(long)]
        keep_run_dirs: bool,
    },

    /// List configured classifiers and check their backends
    Classifiers {
        /// Path to configuration file
        #[arg(long, short = 'c', default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Render a saved benchmark summary
    Report {
        /// Summary JSON written by `treebench run`
        input: PathBuf,

        /// Report format: table, markdown, json
        #[arg(long, short = 'f', default_value = "table")]
        format: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Write a template configuration listing every driver
    Init {
        /// Output file (.toml, .json, .yaml)
        #[arg(long, short = 'o', default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate a configuration file and its backends
    Validate {
        /// Path to configuration file
        #[arg(long, short = 'c', default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_filters() {
        let cli = Cli::parse_from([
            "treebench",
            "run",
            "--classifier",
            "balsa",
            "--classifier",
            "ranger",
            "--dataset",
            "mnist",
            "-j",
            "4",
            "--timeout",
            "600",
        ]);
        match cli.command {
            Commands::Run {
                classifiers,
                datasets,
                jobs,
                timeout,
                format,
                config,
                ..
            } => {
                assert_eq!(classifiers, vec!["balsa", "ranger"]);
                assert_eq!(datasets, vec!["mnist"]);
                assert_eq!(jobs, Some(4));
                assert_eq!(timeout, Some(600));
                assert_eq!(format, "table");
                assert_eq!(config, PathBuf::from(DEFAULT_CONFIG_FILE));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_config_init() {
        let cli = Cli::parse_from(["treebench", "-v", "config", "init", "-o", "bench.json"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Config {
                action: ConfigAction::Init { output, force },
            } => {
                assert_eq!(output, PathBuf::from("bench.json"));
                assert!(!force);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
