//! Exclusive working directories for benchmark jobs
//!
//! Backends and drivers write intermediate artifacts into their working
//! directory, so every job runs in a directory nobody else uses.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{BenchError, BenchResult};

/// Working directory owned by a single job
pub struct RunDirectory {
    /// Temporary directory (owned, removed on drop unless preserved)
    temp_dir: Option<TempDir>,

    /// Path to the directory
    root: PathBuf,

    /// Whether to keep the directory after the job
    preserve: bool,
}

impl RunDirectory {
    /// Create a fresh directory `<base>/<job_id>-XXXXXX`
    pub fn create(base: &Path, job_id: &str) -> BenchResult<Self> {
        std::fs::create_dir_all(base)
            .map_err(|e| BenchError::io(format!("Failed to create work directory {:?}", base), e))?;

        let temp_dir = tempfile::Builder::new()
            .prefix(&format!("{}-", job_id))
            .tempdir_in(base)
            .map_err(|e| BenchError::io(format!("Failed to create run directory in {:?}", base), e))?;
        let root = temp_dir.path().to_path_buf();

        tracing::debug!("Created run directory: {:?}", root);

        Ok(Self {
            temp_dir: Some(temp_dir),
            root,
            preserve: false,
        })
    }

    /// Get the directory path
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Set whether to keep the directory after the job
    pub fn set_preserve(&mut self, preserve: bool) {
        self.preserve = preserve;
    }

    /// Finish the job: keep the directory if requested, otherwise remove it
    ///
    /// Returns the path when the directory was kept.
    pub fn finish(mut self) -> Option<PathBuf> {
        let temp_dir = self.temp_dir.take()?;

        if self.preserve {
            let path = temp_dir.keep();
            tracing::debug!("Preserving run directory at {:?}", path);
            Some(path)
        } else {
            drop(temp_dir);
            tracing::debug!("Cleaned up run directory {:?}", self.root);
            None
        }
    }
}
