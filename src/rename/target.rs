//! Target directory checks run before any other phase.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

use crate::errors::RenumberError;

/// Ensure `dir` exists, is a directory and can be listed; return its canonical
/// form so that staging and target paths share one spelling.
pub fn validate_target_dir(dir: &Path) -> Result<PathBuf, RenumberError> {
    ensure_dir_exists_and_is_dir(dir)?;
    ensure_readable(dir)?;
    let real = dunce::canonicalize(dir).map_err(|e| RenumberError::input_io(dir, &e))?;
    debug!(dir = %real.display(), "target directory validated");
    Ok(real)
}

fn ensure_dir_exists_and_is_dir(path: &Path) -> Result<(), RenumberError> {
    let meta = fs::metadata(path).map_err(|e| {
        error!("target directory is not accessible: {} ({e})", path.display());
        RenumberError::input_io(path, &e)
    })?;
    if !meta.is_dir() {
        error!("target is not a directory: {}", path.display());
        return Err(RenumberError::input(path, "not a directory"));
    }
    Ok(())
}

fn ensure_readable(path: &Path) -> Result<(), RenumberError> {
    fs::read_dir(path).map_err(|e| {
        RenumberError::input(path, format!("cannot read directory; check permissions ({e})"))
    })?;
    Ok(())
}
