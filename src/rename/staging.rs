//! The staging area: a hidden, uniquely named child of the target directory.
//!
//! Files are moved in here under their final names, so no relocation in the
//! staging phase can land on a name that is still occupied in the target
//! directory. The area is a scoped resource: dropping it removes the directory
//! only if it is empty. A populated staging area may hold the only copy of a
//! file, so it is reported and left alone.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::errors::RenumberError;
use crate::fs_ops::{io_error_with_help_io, list_dir, staging_dir_candidate};

use super::report::CleanupReport;

const MAX_CREATE_ATTEMPTS: u32 = 8;

#[derive(Debug)]
pub struct StagingArea {
    path: PathBuf,
    simulated: bool,
    released: bool,
}

impl StagingArea {
    /// Create a fresh, empty staging directory inside `target_dir`.
    pub fn create(target_dir: &Path) -> Result<Self, RenumberError> {
        for attempt in 0..MAX_CREATE_ATTEMPTS {
            let candidate = staging_dir_candidate(target_dir, attempt);
            // create_dir (not create_dir_all) fails on an existing entry.
            match fs::create_dir(&candidate) {
                Ok(()) => {
                    debug!(path = %candidate.display(), "staging area created");
                    return Ok(Self {
                        path: candidate,
                        simulated: false,
                        released: false,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    let e = io_error_with_help_io("create staging directory", &candidate)(e);
                    return Err(RenumberError::input_io(target_dir, &e));
                }
            }
        }
        Err(RenumberError::input(
            target_dir,
            "could not find a free staging directory name",
        ))
    }

    /// Staging area for a dry run: the path is computed, nothing is created.
    pub fn simulated(target_dir: &Path) -> Self {
        Self {
            path: staging_dir_candidate(target_dir, 0),
            simulated: true,
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_simulated(&self) -> bool {
        self.simulated
    }

    /// Where a file with `final_name` lives while staged.
    pub fn staged_path(&self, final_name: &str) -> PathBuf {
        self.path.join(final_name)
    }

    /// Entries currently on disk in the staging directory.
    pub fn contents(&self) -> Vec<PathBuf> {
        if self.simulated {
            return Vec::new();
        }
        list_dir(&self.path).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "cannot list staging directory");
            Vec::new()
        })
    }

    /// Remove the directory if empty; otherwise leave it and report it.
    pub fn finish(mut self) -> CleanupReport {
        self.released = true;
        self.cleanup()
    }

    fn cleanup(&self) -> CleanupReport {
        if self.simulated {
            return CleanupReport::Simulated(self.path.clone());
        }
        // remove_dir never deletes contents: a populated directory is an error here.
        match fs::remove_dir(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "staging area removed");
                CleanupReport::Removed(self.path.clone())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => CleanupReport::Removed(self.path.clone()),
            Err(e) => {
                let entries = self.contents();
                warn!(
                    path = %self.path.display(),
                    remaining = entries.len(),
                    error = %e,
                    "staging directory left in place; inspect it before re-running"
                );
                for entry in &entries {
                    info!(file = %entry.display(), "still staged");
                }
                CleanupReport::LeftInPlace {
                    path: self.path.clone(),
                    entries,
                }
            }
        }
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if !self.released {
            let _ = self.cleanup();
        }
    }
}
