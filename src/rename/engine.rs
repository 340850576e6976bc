//! The staging/commit protocol and the end-to-end renumber run.
//!
//! Matching -> Planning -> Staging -> Verifying -> Committing -> CleaningUp -> Done
//!
//! `Session::stage` moves every source into a fresh staging directory under its
//! final name; `StagedSession::commit` checks that none of those names exists in
//! the target directory and then moves everything back. Failures are terminal:
//! nothing is retried or rolled back automatically.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::errors::RenumberError;
use crate::fs_ops::{DirLock, DryRunRelocator, FsRelocator, Relocator, try_acquire_dir_lock};
use crate::shutdown;

use super::matcher::{self, NamePattern};
use super::planner::{self, PlannedMove};
use super::report::{CleanupReport, Outcome, Phase, ProgressSink, Relocation};
use super::staging::StagingArea;
use super::target::validate_target_dir;
use super::transcript::Transcript;
use super::transform::IndexTransform;

/// Knobs for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Record intents only; never touch the filesystem.
    pub dry_run: bool,
    /// One progress line per relocation instead of a single summary line.
    pub verbose: bool,
    /// Take the advisory directory lock (real runs only).
    pub use_lock: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            verbose: false,
            use_lock: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Matching,
    Planning,
    Staging,
    Verifying,
    Committing,
    CleaningUp,
    Done,
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Matching => "matching",
            RunState::Planning => "planning",
            RunState::Staging => "staging",
            RunState::Verifying => "verifying",
            RunState::Committing => "committing",
            RunState::CleaningUp => "cleaning_up",
            RunState::Done => "done",
        }
    }
}

fn enter(state: RunState) {
    debug!(phase = state.as_str(), "entering phase");
}

/// A file sitting in the staging directory under its final name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub final_name: String,
    pub staged_path: PathBuf,
}

/// Owns everything a run needs before staging starts: the relocator, the
/// directory lock and the optional transcript.
pub struct Session {
    target_dir: PathBuf,
    options: RunOptions,
    relocator: Box<dyn Relocator>,
    transcript: Option<Transcript>,
    relocations: Vec<Relocation>,
    _lock: Option<DirLock>,
}

impl Session {
    /// Open a session on an already validated target directory.
    pub fn open(target_dir: &Path, options: RunOptions) -> Result<Self, RenumberError> {
        let relocator: Box<dyn Relocator> = if options.dry_run {
            Box::new(DryRunRelocator::new())
        } else {
            Box::new(FsRelocator)
        };
        Self::with_relocator(target_dir, options, relocator)
    }

    /// Open a session with a caller-provided relocator.
    pub fn with_relocator(
        target_dir: &Path,
        options: RunOptions,
        relocator: Box<dyn Relocator>,
    ) -> Result<Self, RenumberError> {
        let lock = if options.use_lock && !relocator.is_simulated() {
            match try_acquire_dir_lock(target_dir) {
                Ok(Some(lock)) => Some(lock),
                Ok(None) => {
                    return Err(RenumberError::Locked {
                        dir: target_dir.to_path_buf(),
                    });
                }
                Err(e) => {
                    return Err(RenumberError::input(
                        target_dir,
                        format!("cannot create lock file ({e}); use --disable-locks on filesystems without flock"),
                    ));
                }
            }
        } else {
            None
        };

        Ok(Self {
            target_dir: target_dir.to_path_buf(),
            options,
            relocator,
            transcript: None,
            relocations: Vec::new(),
            _lock: lock,
        })
    }

    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = Some(transcript);
        self
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Move every source into a new staging directory under its final name.
    pub fn stage(
        mut self,
        moves: &[PlannedMove],
        sink: &mut dyn ProgressSink,
    ) -> Result<StagedSession, RenumberError> {
        enter(RunState::Staging);
        if let Err(e) = shutdown::check() {
            return Err(self.fail(e));
        }

        let staging = if self.relocator.is_simulated() {
            StagingArea::simulated(&self.target_dir)
        } else {
            match StagingArea::create(&self.target_dir) {
                Ok(s) => s,
                Err(e) => return Err(self.fail(e)),
            }
        };
        if let Some(t) = self.transcript.as_mut() {
            t.run_start(&self.target_dir, staging.path());
        }

        let mut staged: Vec<StagedFile> = Vec::with_capacity(moves.len());
        for mv in moves {
            let to = staging.staged_path(&mv.final_name);
            if shutdown::is_requested() {
                if staged.is_empty() {
                    return Err(self.fail(RenumberError::Interrupted));
                }
                let in_flight = staged.iter().map(|f| f.staged_path.clone()).collect();
                return Err(self.partial_failure(&staging, in_flight, "interrupted".to_string()));
            }
            if let Err(e) = self.relocator.relocate(&mv.source, &to) {
                let in_flight = staged.iter().map(|f| f.staged_path.clone()).collect();
                return Err(self.partial_failure(&staging, in_flight, e.to_string()));
            }
            self.record(
                Relocation {
                    phase: Phase::Stage,
                    from: mv.source.clone(),
                    to: to.clone(),
                },
                sink,
            );
            staged.push(StagedFile {
                final_name: mv.final_name.clone(),
                staged_path: to,
            });
        }

        Ok(StagedSession {
            session: self,
            staging,
            staged,
        })
    }

    fn record(&mut self, relocation: Relocation, sink: &mut dyn ProgressSink) {
        debug!(
            phase = relocation.phase.as_str(),
            from = %relocation.from.display(),
            to = %relocation.to.display(),
            dry_run = self.options.dry_run,
            "relocation"
        );
        if self.options.verbose {
            sink.line(&format!("{}{relocation}", self.line_prefix()));
        }
        if let Some(t) = self.transcript.as_mut() {
            t.relocation(&relocation);
        }
        self.relocations.push(relocation);
    }

    fn line_prefix(&self) -> &'static str {
        if self.options.dry_run { "[dry-run] " } else { "" }
    }

    /// Build a `PartialFailure` naming exactly what is left in staging.
    fn partial_failure(
        &mut self,
        staging: &StagingArea,
        in_flight: Vec<PathBuf>,
        cause: String,
    ) -> RenumberError {
        let remaining = if staging.is_simulated() {
            in_flight
        } else {
            staging.contents()
        };
        self.fail(RenumberError::PartialFailure {
            staging_dir: staging.path().to_path_buf(),
            remaining,
            cause,
        })
    }

    fn fail(&mut self, err: RenumberError) -> RenumberError {
        debug!(code = err.code(), kind = err.kind(), "run aborted");
        if let Some(t) = self.transcript.as_mut() {
            t.run_end(Err(&err));
        }
        err
    }
}

/// A session whose files all sit in the staging directory.
pub struct StagedSession {
    session: Session,
    staging: StagingArea,
    staged: Vec<StagedFile>,
}

impl StagedSession {
    pub fn staging_dir(&self) -> &Path {
        self.staging.path()
    }

    pub fn staged(&self) -> &[StagedFile] {
        &self.staged
    }

    /// Relocations recorded so far (the staging phase).
    pub fn relocations(&self) -> &[Relocation] {
        &self.session.relocations
    }

    /// Fail closed if any final name is already taken in the target directory.
    pub fn verify(&self) -> Result<(), RenumberError> {
        let mut names = Vec::new();
        for f in &self.staged {
            let dest = self.session.target_dir.join(&f.final_name);
            match self.session.relocator.exists(&dest) {
                Ok(false) => {}
                Ok(true) => names.push(f.final_name.clone()),
                Err(e) => {
                    warn!(path = %dest.display(), error = %e, "cannot stat commit destination; treating as collision");
                    names.push(f.final_name.clone());
                }
            }
        }
        if names.is_empty() {
            Ok(())
        } else {
            Err(RenumberError::Collision {
                staging_dir: Some(self.staging.path().to_path_buf()),
                names,
            })
        }
    }

    /// Verify, then move every staged file into the target directory.
    pub fn commit(mut self, sink: &mut dyn ProgressSink) -> Result<Outcome, RenumberError> {
        enter(RunState::Verifying);
        if let Err(e) = self.verify() {
            return Err(self.session.fail(e));
        }

        enter(RunState::Committing);
        for (i, f) in self.staged.iter().enumerate() {
            let dest = self.session.target_dir.join(&f.final_name);
            if shutdown::is_requested() {
                let in_flight = self.staged[i..].iter().map(|s| s.staged_path.clone()).collect();
                return Err(self.session.partial_failure(&self.staging, in_flight, "interrupted".to_string()));
            }
            if let Err(e) = self.session.relocator.relocate(&f.staged_path, &dest) {
                let in_flight = self.staged[i..].iter().map(|s| s.staged_path.clone()).collect();
                return Err(self.session.partial_failure(&self.staging, in_flight, e.to_string()));
            }
            self.session.record(
                Relocation {
                    phase: Phase::Commit,
                    from: f.staged_path.clone(),
                    to: dest,
                },
                sink,
            );
        }

        enter(RunState::CleaningUp);
        let StagedSession {
            mut session,
            staging,
            staged,
        } = self;
        let staging_dir = staging.path().to_path_buf();
        let cleanup = staging.finish();
        if let CleanupReport::LeftInPlace { path, entries } = &cleanup {
            sink.line(&format!(
                "staging directory left in place: {} ({} entries)",
                path.display(),
                entries.len()
            ));
        }

        if !session.options.verbose {
            let verb = if session.options.dry_run {
                "[dry-run] would renumber"
            } else {
                "renumbered"
            };
            sink.line(&format!(
                "{verb} {} file(s) in {}",
                staged.len(),
                session.target_dir.display()
            ));
        }
        if let Some(t) = session.transcript.as_mut() {
            t.run_end(Ok(()));
        }

        enter(RunState::Done);
        info!(
            files = staged.len(),
            dir = %session.target_dir.display(),
            dry_run = session.options.dry_run,
            "run complete"
        );
        Ok(Outcome {
            target_dir: session.target_dir,
            staging_dir,
            relocations: std::mem::take(&mut session.relocations),
            cleanup,
            dry_run: session.options.dry_run,
        })
    }
}

/// What to renumber.
#[derive(Debug, Clone)]
pub struct Job {
    pub dir: PathBuf,
    pub pattern: NamePattern,
}

impl Job {
    pub fn new(dir: impl Into<PathBuf>, pattern: NamePattern) -> Self {
        Self {
            dir: dir.into(),
            pattern,
        }
    }
}

/// Refuse a plan whose final names are already held by entries it does not
/// move (a directory, a symlink, a file outside the pattern). Nothing is
/// touched; the commit-time verify still catches entries that appear later.
pub fn check_final_names(dir: &Path, moves: &[PlannedMove]) -> Result<(), RenumberError> {
    let sources: HashSet<&Path> = moves.iter().map(|m| m.source.as_path()).collect();
    let mut names = Vec::new();
    for mv in moves {
        let dest = dir.join(&mv.final_name);
        if sources.contains(dest.as_path()) {
            continue;
        }
        match fs::symlink_metadata(&dest) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Ok(_) => names.push(mv.final_name.clone()),
            Err(e) => {
                warn!(path = %dest.display(), error = %e, "cannot stat final name; treating as collision");
                names.push(mv.final_name.clone());
            }
        }
    }
    if names.is_empty() {
        Ok(())
    } else {
        debug!(collisions = names.len(), "final names already taken before staging");
        Err(RenumberError::Collision {
            staging_dir: None,
            names,
        })
    }
}

/// Match, plan, stage, verify, commit and clean up in one call.
///
/// The directory lock is taken only once a plan exists, so a run that finds
/// nothing to do never writes to the target directory.
pub fn renumber(
    job: &Job,
    transform: &dyn IndexTransform,
    options: RunOptions,
    transcript: Option<Transcript>,
    sink: &mut dyn ProgressSink,
) -> Result<Outcome, RenumberError> {
    let dir = validate_target_dir(&job.dir)?;

    enter(RunState::Matching);
    let entries = matcher::scan(&dir, &job.pattern)?;

    enter(RunState::Planning);
    let plan = planner::plan(&dir, &job.pattern, entries, transform)?;
    info!(
        files = plan.len(),
        padding_width = plan.padding_width(),
        transform = plan.transform_name(),
        "plan ready"
    );
    let moves = plan.moves();
    check_final_names(&dir, &moves)?;

    let mut session = Session::open(&dir, options)?;
    if let Some(t) = transcript {
        session = session.with_transcript(t);
    }
    let staged = session.stage(&moves, sink)?;
    staged.commit(sink)
}
