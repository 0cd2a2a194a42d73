//! treebench command-line interface
//!
//! Loads a benchmark configuration, validates every backend up front and
//! runs the planned jobs, printing a report at the end.
//!
//! Set `RUST_LOG` to control logging; `--verbose` defaults it to `debug`.

#![allow(clippy::too_many_arguments)]

mod args;
mod commands;
mod console;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use args::{Cli, Commands, ConfigAction};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Run {
            config,
            classifiers,
            datasets,
            jobs,
            timeout,
            format,
            output,
            no_save,
            keep_run_dirs,
        } => {
            commands::run::run(
                &config,
                classifiers,
                datasets,
                jobs,
                timeout,
                &format,
                output,
                no_save,
                keep_run_dirs,
            )
            .await
        }
        Commands::Classifiers { config } => commands::classifiers::list(&config).await,
        Commands::Config { action } => match action {
            ConfigAction::Init { output, force } => commands::config::init(&output, force).await,
            ConfigAction::Validate { config } => commands::config::validate(&config).await,
        },
        Commands::Report { input, format } => commands::report::show(&input, &format).await,
    }
}

fn init_logging(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
