//! What a run did (or would do), and where progress lines go.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::output;

/// Which half of the protocol a relocation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Stage,
    Commit,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Stage => "staged",
            Phase::Commit => "committed",
        }
    }
}

/// One relocation, performed or simulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub phase: Phase,
    pub from: PathBuf,
    pub to: PathBuf,
}

impl fmt::Display for Relocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {}",
            self.phase.as_str(),
            self.from.display(),
            self.to.display()
        )
    }
}

/// State of the staging directory after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupReport {
    Removed(PathBuf),
    /// Non-empty; never force-deleted.
    LeftInPlace { path: PathBuf, entries: Vec<PathBuf> },
    /// Dry run: the directory was never created.
    Simulated(PathBuf),
}

impl CleanupReport {
    pub fn path(&self) -> &Path {
        match self {
            CleanupReport::Removed(p) | CleanupReport::Simulated(p) => p,
            CleanupReport::LeftInPlace { path, .. } => path,
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub target_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub relocations: Vec<Relocation>,
    pub cleanup: CleanupReport,
    pub dry_run: bool,
}

impl Outcome {
    /// Number of files carried through both phases.
    pub fn files(&self) -> usize {
        self.relocations
            .iter()
            .filter(|r| r.phase == Phase::Commit)
            .count()
    }

    /// (original, final) pairs, joining each stage step with its commit step.
    pub fn renames(&self) -> Vec<(PathBuf, PathBuf)> {
        let commits: Vec<&Relocation> = self
            .relocations
            .iter()
            .filter(|r| r.phase == Phase::Commit)
            .collect();
        self.relocations
            .iter()
            .filter(|r| r.phase == Phase::Stage)
            .filter_map(|s| {
                commits
                    .iter()
                    .find(|c| c.from == s.to)
                    .map(|c| (s.from.clone(), c.to.clone()))
            })
            .collect()
    }
}

/// Caller-supplied destination for human-readable progress lines.
pub trait ProgressSink {
    fn line(&mut self, line: &str);
}

impl ProgressSink for Vec<String> {
    fn line(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

/// Prints each line to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn line(&mut self, line: &str) {
        output::print_user(line);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn line(&mut self, _line: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(phase: Phase, from: &str, to: &str) -> Relocation {
        Relocation { phase, from: from.into(), to: to.into() }
    }

    #[test]
    fn renames_join_stage_and_commit() {
        let outcome = Outcome {
            target_dir: "/d".into(),
            staging_dir: "/d/.s".into(),
            relocations: vec![
                r(Phase::Stage, "/d/a_1.tif", "/d/.s/a_2.tif"),
                r(Phase::Stage, "/d/a_2.tif", "/d/.s/a_1.tif"),
                r(Phase::Commit, "/d/.s/a_2.tif", "/d/a_2.tif"),
                r(Phase::Commit, "/d/.s/a_1.tif", "/d/a_1.tif"),
            ],
            cleanup: CleanupReport::Removed("/d/.s".into()),
            dry_run: false,
        };
        assert_eq!(outcome.files(), 2);
        let renames = outcome.renames();
        assert_eq!(renames[0], (PathBuf::from("/d/a_1.tif"), PathBuf::from("/d/a_2.tif")));
        assert_eq!(renames[1], (PathBuf::from("/d/a_2.tif"), PathBuf::from("/d/a_1.tif")));
    }

    #[test]
    fn relocation_display() {
        let line = r(Phase::Stage, "/d/a", "/d/.s/b").to_string();
        assert_eq!(line, "staged /d/a -> /d/.s/b");
    }
}
