//! Collision-free bulk renumbering of numbered file sets.
//!
//! A run matches `PREFIX<digits>.EXTENSION` files in one directory, plans a
//! new numbering (reversed by default), moves every file into a hidden staging
//! directory under its final name, checks that no final name is taken, and
//! moves everything back. No file is ever overwritten.
//!
//! ```no_run
//! use renumber::{Job, NamePattern, NullSink, RenumberError, Reverse, RunOptions, renumber};
//!
//! let job = Job::new("/scans/box1", NamePattern::new("page_", "tif")?);
//! let outcome = renumber(&job, &Reverse, RunOptions::default(), None, &mut NullSink)?;
//! println!("{} files renumbered", outcome.files());
//! # Ok::<(), RenumberError>(())
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs_ops;
pub mod output;
pub mod platform;
pub mod rename;
pub mod shutdown;

pub use config::{
    CONFIG_ENV_VAR, Config, LogLevel, default_config_path, default_log_path, load_config,
    path_has_symlink_ancestor,
};
pub use errors::RenumberError;
pub use rename::{
    CleanupReport, ConsoleSink, FileEntry, IndexTransform, Job, NamePattern, NullSink, Order,
    Outcome, Phase, PlannedMove, ProgressSink, RecordedRun, Relocation, RenamePlan, Reverse,
    RunOptions, RunState, Sequential, Session, StagedFile, StagedSession, StagingArea,
    Transcript, last_run, plan, plan_undo, renumber, scan, undo, validate_target_dir,
};
