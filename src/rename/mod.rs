//! Collision-free bulk renumbering.
//!
//! matcher -> planner -> engine (staging, verify, commit, cleanup). `undo`
//! replays a transcript backwards through the same engine.

pub mod engine;
pub mod matcher;
pub mod planner;
pub mod report;
pub mod staging;
pub mod target;
pub mod token;
pub mod transcript;
pub mod transform;
pub mod undo;

pub use engine::{Job, RunOptions, RunState, Session, StagedFile, StagedSession, renumber};
pub use matcher::{FileEntry, NamePattern, scan};
pub use planner::{PlannedMove, RenamePlan, plan};
pub use report::{CleanupReport, ConsoleSink, NullSink, Outcome, Phase, ProgressSink, Relocation};
pub use staging::StagingArea;
pub use target::validate_target_dir;
pub use transcript::{RecordedRun, Transcript, last_run};
pub use transform::{IndexTransform, Order, Reverse, Sequential};
pub use undo::{plan_undo, undo};
