//! Append-only transcript of relocations, and the reader used by `undo`.
//!
//! Line format (one event per line, timestamp separated by two spaces):
//!
//! ```text
//! 2026-10-16T09:12:01.123+02:00  RUN_START: /scans/box1 -> /scans/box1/.renumber-staging.42.17
//! 2026-10-16T09:12:01.124+02:00  STAGED: /scans/box1/a_01.tif -> /scans/box1/.renumber-staging.42.17/a_03.tif
//! 2026-10-16T09:12:01.130+02:00  COMMITTED: /scans/box1/.renumber-staging.42.17/a_03.tif -> /scans/box1/a_03.tif
//! 2026-10-16T09:12:01.131+02:00  RUN_END: ok
//! 2026-10-16T09:14:40.002+02:00  UNDONE: /scans/box1/.renumber-staging.42.17
//! ```
//!
//! Dry-run events carry a `DRY: ` marker before the tag and are never replayed.
//! `UNDONE` names a run by its staging directory, which is unique per run.
//! Paths containing " -> " or line breaks cannot be read back.

use chrono::Local;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::errors::RenumberError;
use crate::platform::open_log_file_secure_append;

use super::report::{Phase, Relocation};

const DRY_MARKER: &str = "DRY: ";
const ARROW: &str = " -> ";

pub struct Transcript {
    path: PathBuf,
    file: File,
    dry_run: bool,
    write_failed: bool,
}

impl Transcript {
    pub fn open(path: &Path, dry_run: bool) -> Result<Self, RenumberError> {
        let file = open_log_file_secure_append(path).map_err(|e| RenumberError::Transcript {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            dry_run,
            write_failed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn run_start(&mut self, target_dir: &Path, staging_dir: &Path) {
        self.write(&format!(
            "RUN_START: {}{ARROW}{}",
            target_dir.display(),
            staging_dir.display()
        ));
    }

    pub fn relocation(&mut self, r: &Relocation) {
        let tag = match r.phase {
            Phase::Stage => "STAGED",
            Phase::Commit => "COMMITTED",
        };
        self.write(&format!(
            "{tag}: {}{ARROW}{}",
            r.from.display(),
            r.to.display()
        ));
    }

    /// Record that the run staged through `staging_dir` has been undone.
    pub fn mark_undone(&mut self, staging_dir: &Path) {
        self.write(&format!("UNDONE: {}", staging_dir.display()));
    }

    pub fn run_end(&mut self, result: Result<(), &RenumberError>) {
        match result {
            Ok(()) => self.write("RUN_END: ok"),
            Err(e) => self.write(&format!("RUN_END: failed ({}): {e}", e.kind())),
        }
    }

    /// The transcript is a convenience for the operator; a failed write is
    /// logged once and does not stop the run.
    fn write(&mut self, body: &str) {
        let marker = if self.dry_run { DRY_MARKER } else { "" };
        let line = format!("{}  {marker}{body}\n", Local::now().to_rfc3339());
        if let Err(e) = self.file.write_all(line.as_bytes()).and_then(|_| self.file.flush()) {
            if !self.write_failed {
                warn!(path = %self.path.display(), error = %e, "failed to write transcript");
            }
            self.write_failed = true;
        }
    }
}

/// One non-dry run read back from a transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedRun {
    pub target_dir: PathBuf,
    pub staging_dir: PathBuf,
    /// (original path, staged path) in the order they happened.
    pub staged: Vec<(PathBuf, PathBuf)>,
    /// staged path -> final path.
    pub committed: HashMap<PathBuf, PathBuf>,
    pub finished: Option<String>,
    /// An `UNDONE` line names this run.
    pub undone: bool,
}

impl RecordedRun {
    /// Where each originally staged file is now: its final path if the commit
    /// step was recorded, else its staged path.
    pub fn current_locations(&self) -> Vec<(PathBuf, PathBuf)> {
        self.staged
            .iter()
            .map(|(orig, staged)| {
                let now = self.committed.get(staged).unwrap_or(staged).clone();
                (orig.clone(), now)
            })
            .collect()
    }
}

/// Paths are taken verbatim; names may legitimately end in spaces.
fn split_pair(body: &str) -> Option<(PathBuf, PathBuf)> {
    let (a, b) = body.split_once(ARROW)?;
    Some((PathBuf::from(a), PathBuf::from(b)))
}

/// Parse `path` and return the last non-dry run that staged at least one file.
/// Fails if that run has already been undone.
pub fn last_run(path: &Path) -> Result<RecordedRun, RenumberError> {
    let bad = |reason: String| RenumberError::Transcript {
        path: path.to_path_buf(),
        reason,
    };
    let text = fs::read_to_string(path).map_err(|e| bad(e.to_string()))?;

    let mut runs: Vec<RecordedRun> = Vec::new();
    for (no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let Some((_ts, body)) = line.split_once("  ") else {
            return Err(bad(format!("line {}: missing timestamp separator", no + 1)));
        };
        let body = body.trim_start();
        if body.starts_with(DRY_MARKER) {
            continue;
        }
        let Some((tag, rest)) = body.split_once(": ") else {
            return Err(bad(format!("line {}: missing event tag", no + 1)));
        };
        match tag {
            "RUN_START" => {
                let (target_dir, staging_dir) = split_pair(rest)
                    .ok_or_else(|| bad(format!("line {}: malformed RUN_START", no + 1)))?;
                runs.push(RecordedRun {
                    target_dir,
                    staging_dir,
                    ..RecordedRun::default()
                });
            }
            "UNDONE" => {
                let staging = Path::new(rest);
                let idx = runs
                    .iter()
                    .rposition(|r| r.staging_dir == staging)
                    .ok_or_else(|| bad(format!("line {}: UNDONE names no recorded run", no + 1)))?;
                // The undo itself may have been recorded here too; it is part
                // of the same reversal.
                let dir = runs[idx].target_dir.clone();
                for run in runs[idx..].iter_mut().filter(|r| r.target_dir == dir) {
                    run.undone = true;
                }
            }
            "STAGED" | "COMMITTED" | "RUN_END" => {
                let run = runs
                    .last_mut()
                    .ok_or_else(|| bad(format!("line {}: {tag} before RUN_START", no + 1)))?;
                if tag == "RUN_END" {
                    run.finished = Some(rest.to_string());
                    continue;
                }
                let (from, to) = split_pair(rest)
                    .ok_or_else(|| bad(format!("line {}: malformed {tag}", no + 1)))?;
                if tag == "STAGED" {
                    run.staged.push((from, to));
                } else {
                    run.committed.insert(from, to);
                }
            }
            other => return Err(bad(format!("line {}: unknown event '{other}'", no + 1))),
        }
    }

    let run = runs
        .into_iter()
        .rev()
        .find(|r| !r.staged.is_empty())
        .ok_or_else(|| bad("no recorded run with staged files".to_string()))?;
    if run.undone {
        return Err(bad(format!(
            "the last run in {} was already undone",
            run.target_dir.display()
        )));
    }
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn reloc(phase: Phase, from: &str, to: &str) -> Relocation {
        Relocation { phase, from: from.into(), to: to.into() }
    }

    #[test]
    fn written_run_reads_back() {
        let td = tempdir().unwrap();
        let path = td.path().join("t.log");
        {
            let mut t = Transcript::open(&path, false).unwrap();
            t.run_start(Path::new("/d"), Path::new("/d/.s"));
            t.relocation(&reloc(Phase::Stage, "/d/a_1.tif", "/d/.s/a_2.tif"));
            t.relocation(&reloc(Phase::Stage, "/d/a_2.tif", "/d/.s/a_1.tif"));
            t.relocation(&reloc(Phase::Commit, "/d/.s/a_2.tif", "/d/a_2.tif"));
            t.run_end(Ok(()));
        }
        let run = last_run(&path).unwrap();
        assert_eq!(run.target_dir, PathBuf::from("/d"));
        assert_eq!(run.staged.len(), 2);
        assert_eq!(run.finished.as_deref(), Some("ok"));
        let now = run.current_locations();
        assert_eq!(now[0], (PathBuf::from("/d/a_1.tif"), PathBuf::from("/d/a_2.tif")));
        // Second file was never committed: still in staging.
        assert_eq!(now[1], (PathBuf::from("/d/a_2.tif"), PathBuf::from("/d/.s/a_1.tif")));
    }

    #[test]
    fn dry_runs_are_skipped() {
        let td = tempdir().unwrap();
        let path = td.path().join("t.log");
        {
            let mut real = Transcript::open(&path, false).unwrap();
            real.run_start(Path::new("/real"), Path::new("/real/.s"));
            real.relocation(&reloc(Phase::Stage, "/real/a_1.tif", "/real/.s/a_1.tif"));
        }
        {
            let mut dry = Transcript::open(&path, true).unwrap();
            dry.run_start(Path::new("/dry"), Path::new("/dry/.s"));
            dry.relocation(&reloc(Phase::Stage, "/dry/a_1.tif", "/dry/.s/a_1.tif"));
        }
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("DRY: RUN_START"));
        assert_eq!(last_run(&path).unwrap().target_dir, PathBuf::from("/real"));
    }

    #[test]
    fn empty_or_garbage_is_an_error() {
        let td = tempdir().unwrap();
        let path = td.path().join("t.log");
        fs::write(&path, "").unwrap();
        assert!(matches!(last_run(&path), Err(RenumberError::Transcript { .. })));
        fs::write(&path, "2026-01-01T00:00:00+00:00  STAGED: /a -> /b\n").unwrap();
        assert!(matches!(last_run(&path), Err(RenumberError::Transcript { .. })));
        fs::write(&path, "garbage\n").unwrap();
        assert!(matches!(last_run(&path), Err(RenumberError::Transcript { .. })));
    }

    #[test]
    fn undone_run_is_not_offered_again() {
        let td = tempdir().unwrap();
        let path = td.path().join("t.log");
        {
            let mut t = Transcript::open(&path, false).unwrap();
            t.run_start(Path::new("/d"), Path::new("/d/.s1"));
            t.relocation(&reloc(Phase::Stage, "/d/a_1.tif", "/d/.s1/a_1.tif"));
            t.run_end(Ok(()));
        }
        assert!(!last_run(&path).unwrap().undone);
        Transcript::open(&path, false).unwrap().mark_undone(Path::new("/d/.s1"));
        let err = last_run(&path).unwrap_err();
        assert!(err.to_string().contains("already undone"), "{err}");

        // A later run is undoable again.
        {
            let mut t = Transcript::open(&path, false).unwrap();
            t.run_start(Path::new("/d"), Path::new("/d/.s2"));
            t.relocation(&reloc(Phase::Stage, "/d/a_1.tif", "/d/.s2/a_1.tif"));
        }
        assert_eq!(last_run(&path).unwrap().staging_dir, PathBuf::from("/d/.s2"));
    }

    #[test]
    fn paths_with_trailing_spaces_read_back_exactly() {
        let td = tempdir().unwrap();
        let path = td.path().join("t.log");
        {
            let mut t = Transcript::open(&path, false).unwrap();
            t.run_start(Path::new("/scans/box 1 "), Path::new("/scans/box 1 /.s"));
            t.relocation(&reloc(Phase::Stage, "/scans/box 1 /a_1.tif", "/scans/box 1 /.s/a_2.tif "));
        }
        let run = last_run(&path).unwrap();
        assert_eq!(run.target_dir, PathBuf::from("/scans/box 1 "));
        assert_eq!(
            run.staged,
            vec![(PathBuf::from("/scans/box 1 /a_1.tif"), PathBuf::from("/scans/box 1 /.s/a_2.tif "))]
        );
        assert_eq!(run.staged[0].0.parent(), Some(run.target_dir.as_path()));
    }
}
