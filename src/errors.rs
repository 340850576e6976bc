//! Typed error definitions for renumber.
//! Every terminal failure of a run maps to one variant, a stable exit code and a
//! short `kind` string used as a structured log field.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

fn staged_note(staging_dir: Option<&Path>) -> String {
    match staging_dir {
        Some(dir) => format!("files remain staged in {}", dir.display()),
        None => "nothing was moved".to_string(),
    }
}

#[derive(Debug, Error)]
pub enum RenumberError {
    #[error("Invalid input {path}: {reason}")]
    Input { path: PathBuf, reason: String },

    #[error("No entries in {dir} match '{pattern}'")]
    NoMatch { dir: PathBuf, pattern: String },

    #[error("Numeric index {value} is used by more than one file: {}", names.join(", "))]
    DuplicateIndex { value: u64, names: Vec<String> },

    #[error("Index transform '{transform}' is not a permutation of 1..={total}")]
    InvalidTransform { transform: String, total: usize },

    /// `staging_dir` is `None` when the collision was found before anything moved.
    #[error(
        "Target directory already contains {} of the final name(s): {}; {}",
        names.len(),
        names.join(", "),
        staged_note(staging_dir.as_deref())
    )]
    Collision {
        staging_dir: Option<PathBuf>,
        names: Vec<String>,
    },

    #[error(
        "Run stopped part-way ({cause}); {} file(s) remain in staging directory {}",
        remaining.len(),
        staging_dir.display()
    )]
    PartialFailure {
        staging_dir: PathBuf,
        remaining: Vec<PathBuf>,
        cause: String,
    },

    #[error("Directory {dir} is locked by another renumber process")]
    Locked { dir: PathBuf },

    #[error("Cannot use transcript {path}: {reason}")]
    Transcript { path: PathBuf, reason: String },

    #[error("Operation interrupted by user")]
    Interrupted,
}

impl RenumberError {
    /// Process exit code for this failure.
    pub fn code(&self) -> i32 {
        match self {
            RenumberError::Input { .. } => 2,
            RenumberError::NoMatch { .. } => 3,
            RenumberError::DuplicateIndex { .. } => 4,
            RenumberError::Collision { .. } => 5,
            RenumberError::PartialFailure { .. } => 6,
            RenumberError::Locked { .. } => 7,
            RenumberError::Transcript { .. } => 8,
            RenumberError::InvalidTransform { .. } => 9,
            RenumberError::Interrupted => 130,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RenumberError::Input { .. } => "input",
            RenumberError::NoMatch { .. } => "no_match",
            RenumberError::DuplicateIndex { .. } => "duplicate_index",
            RenumberError::Collision { .. } => "collision",
            RenumberError::PartialFailure { .. } => "partial_failure",
            RenumberError::Locked { .. } => "locked",
            RenumberError::Transcript { .. } => "transcript",
            RenumberError::InvalidTransform { .. } => "invalid_transform",
            RenumberError::Interrupted => "interrupted",
        }
    }

    /// True when the target directory may differ from its state before the run.
    pub fn leaves_directory_modified(&self) -> bool {
        matches!(
            self,
            RenumberError::Collision {
                staging_dir: Some(_),
                ..
            } | RenumberError::PartialFailure { .. }
        )
    }

    pub(crate) fn input(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        RenumberError::Input {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn input_io(path: impl Into<PathBuf>, e: &io::Error) -> Self {
        RenumberError::Input {
            path: path.into(),
            reason: e.to_string(),
        }
    }
}
