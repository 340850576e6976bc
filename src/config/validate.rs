//! Checks on the paths a Config will write to.

use anyhow::{Result, bail};
use std::path::Path;
use tracing::debug;

use super::paths::path_has_symlink_ancestor;
use super::types::Config;

impl Config {
    /// Reject log/transcript paths that are directories, and log files below
    /// a symlinked directory.
    pub fn validate(&self) -> Result<()> {
        if let Some(log) = &self.log_file {
            ensure_not_dir(log, "log_file")?;
            if path_has_symlink_ancestor(log)? {
                bail!(
                    "refusing to log to '{}': an ancestor directory is a symlink",
                    log.display()
                );
            }
        }
        if let Some(t) = &self.transcript {
            ensure_not_dir(t, "transcript")?;
        }
        debug!(
            log_level = %self.log_level,
            dry_run = self.dry_run,
            order = %self.order,
            locks = !self.disable_locks,
            "config validated"
        );
        Ok(())
    }
}

fn ensure_not_dir(path: &Path, name: &str) -> Result<()> {
    if path.is_dir() {
        bail!("{name} '{}' is a directory", path.display());
    }
    Ok(())
}
