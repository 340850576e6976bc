//! Undo the last run recorded in a transcript.
//!
//! Every file the run staged is moved back to its original name through the
//! same staging/verify/commit protocol, so undoing a reversal is as
//! collision-free as the reversal itself. Files that never made it out of the
//! staging directory (a run that stopped with a collision or part-way) are
//! picked up from there.
//!
//! A successful undo appends an `UNDONE` line to the transcript it read, so
//! running it twice cannot apply the reversal a second time.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::errors::RenumberError;

use super::engine::{RunOptions, Session, check_final_names};
use super::planner::PlannedMove;
use super::report::{Outcome, ProgressSink};
use super::target::validate_target_dir;
use super::transcript::{RecordedRun, Transcript, last_run};

/// Moves that put every file of `run` back under its original name.
pub fn plan_undo(transcript: &Path, run: &RecordedRun) -> Result<Vec<PlannedMove>, RenumberError> {
    let bad = |reason: String| RenumberError::Transcript {
        path: transcript.to_path_buf(),
        reason,
    };

    let mut seen = HashSet::new();
    let mut moves = Vec::with_capacity(run.staged.len());
    for (original, current) in run.current_locations() {
        if original.parent() != Some(run.target_dir.as_path()) {
            return Err(bad(format!(
                "{} is outside the recorded directory {}",
                original.display(),
                run.target_dir.display()
            )));
        }
        let final_name = original
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| bad(format!("unusable file name: {}", original.display())))?
            .to_string();
        if !seen.insert(final_name.clone()) {
            return Err(bad(format!("{final_name} is restored more than once")));
        }
        match fs::symlink_metadata(&current) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(bad(format!(
                    "{} is no longer at its recorded location",
                    current.display()
                )));
            }
            Err(e) => return Err(bad(format!("cannot stat {}: {e}", current.display()))),
        }
        moves.push(PlannedMove {
            source: current,
            final_name,
        });
    }
    Ok(moves)
}

/// Reverse the last non-dry run recorded in `transcript_path`.
pub fn undo(
    transcript_path: &Path,
    options: RunOptions,
    transcript: Option<Transcript>,
    sink: &mut dyn ProgressSink,
) -> Result<Outcome, RenumberError> {
    let run = last_run(transcript_path)?;
    info!(
        dir = %run.target_dir.display(),
        files = run.staged.len(),
        "undoing recorded run"
    );
    let moves = plan_undo(transcript_path, &run)?;
    let dir = validate_target_dir(&run.target_dir)?;
    check_final_names(&dir, &moves)?;

    let mut session = Session::open(&dir, options)?;
    if let Some(t) = transcript {
        session = session.with_transcript(t);
    }
    let outcome = session.stage(&moves, sink)?.commit(sink)?;

    if !options.dry_run {
        remove_stale_staging(&run.staging_dir);
        mark_undone(transcript_path, &run.staging_dir);
    }
    Ok(outcome)
}

/// The files are already back; a transcript we cannot append to only costs
/// the protection against a repeated undo.
fn mark_undone(transcript_path: &Path, staging_dir: &Path) {
    match Transcript::open(transcript_path, false) {
        Ok(mut t) => t.mark_undone(staging_dir),
        Err(e) => warn!(
            path = %transcript_path.display(),
            error = %e,
            "cannot mark run as undone; a repeated undo would reverse it again"
        ),
    }
}

/// The undone run may have left its staging directory behind; drop it if empty.
fn remove_stale_staging(dir: &Path) {
    match fs::remove_dir(dir) {
        Ok(()) => debug!(path = %dir.display(), "removed staging directory of undone run"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            path = %dir.display(),
            error = %e,
            "staging directory of undone run left in place"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn plan_uses_current_locations() {
        let td = tempdir().unwrap();
        let dir = td.path().to_path_buf();
        let stage = dir.join(".s");
        fs::create_dir(&stage).unwrap();
        fs::write(dir.join("a_2.tif"), b"was 1").unwrap();
        fs::write(stage.join("a_1.tif"), b"was 2").unwrap();

        let run = RecordedRun {
            target_dir: dir.clone(),
            staging_dir: stage.clone(),
            staged: vec![
                (dir.join("a_1.tif"), stage.join("a_2.tif")),
                (dir.join("a_2.tif"), stage.join("a_1.tif")),
            ],
            committed: HashMap::from([(stage.join("a_2.tif"), dir.join("a_2.tif"))]),
            finished: None,
            undone: false,
        };
        let moves = plan_undo(Path::new("t.log"), &run).unwrap();
        assert_eq!(moves[0], PlannedMove { source: dir.join("a_2.tif"), final_name: "a_1.tif".into() });
        assert_eq!(moves[1], PlannedMove { source: stage.join("a_1.tif"), final_name: "a_2.tif".into() });
    }

    #[test]
    fn missing_file_is_reported() {
        let td = tempdir().unwrap();
        let dir = td.path().to_path_buf();
        let run = RecordedRun {
            target_dir: dir.clone(),
            staging_dir: dir.join(".s"),
            staged: vec![(dir.join("a_1.tif"), dir.join(".s/a_1.tif"))],
            committed: HashMap::from([(dir.join(".s/a_1.tif"), dir.join("a_1.tif"))]),
            finished: Some("ok".into()),
            undone: false,
        };
        let err = plan_undo(Path::new("t.log"), &run).unwrap_err();
        assert!(err.to_string().contains("no longer at its recorded location"), "{err}");
    }

    #[test]
    fn originals_outside_dir_are_rejected() {
        let run = RecordedRun {
            target_dir: PathBuf::from("/d"),
            staging_dir: PathBuf::from("/d/.s"),
            staged: vec![(PathBuf::from("/elsewhere/a_1.tif"), PathBuf::from("/d/.s/a_1.tif"))],
            committed: HashMap::new(),
            finished: None,
            undone: false,
        };
        assert!(matches!(
            plan_undo(Path::new("t.log"), &run),
            Err(RenumberError::Transcript { .. })
        ));
    }
}
