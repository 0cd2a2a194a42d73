//! CLI console utilities

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use treebench_core::{JobProgress, JobState};

/// CLI console for formatted output
pub struct CliConsole;

impl CliConsole {
    /// Print an info message
    pub fn info(&self, message: &str) {
        println!("{} {}", "ℹ".blue().bold(), message);
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        println!("{} {}", "✓".green().bold(), message.green());
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        println!("{} {}", "⚠".yellow().bold(), message.yellow());
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message.red());
    }

    /// Print a header
    pub fn print_header(&self, title: &str) {
        println!();
        println!("{}", title.bold().underline());
        println!("{}", "=".repeat(title.len()).dimmed());
    }
}

/// Progress bar over benchmark jobs
pub fn job_progress_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.blue} [{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style.progress_chars("=> "));
    bar
}

/// Reflect a job progress update on the bar
pub fn update_progress_bar(bar: &ProgressBar, progress: &JobProgress) {
    match progress.state {
        JobState::Completed => {
            bar.inc(1);
            bar.println(format!("{} {}", "✓".green().bold(), progress.job_id));
        }
        JobState::Failed => {
            bar.inc(1);
            bar.println(format!(
                "{} {}: {}",
                "✗".red().bold(),
                progress.job_id,
                progress.message.red()
            ));
        }
        _ => bar.set_message(format!("{} ({})", progress.job_id, progress.state)),
    }
}
