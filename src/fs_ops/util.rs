use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Leading component of every staging directory name.
pub const STAGING_DIR_PREFIX: &str = ".renumber-staging";

/// Candidate staging directory path inside `target_dir`.
/// Format: ".renumber-staging.<pid>.<nanos>[.<attempt>]"
pub(crate) fn staging_dir_candidate(target_dir: &Path, attempt: u32) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let name = if attempt == 0 {
        format!("{STAGING_DIR_PREFIX}.{pid}.{nanos}")
    } else {
        format!("{STAGING_DIR_PREFIX}.{pid}.{nanos}.{attempt}")
    };
    target_dir.join(name)
}

/// Entries currently inside `dir`, sorted by name. Missing dir -> empty list.
pub fn list_dir(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let rd = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let mut out = Vec::new();
    for entry in rd {
        out.push(entry?.path());
    }
    out.sort();
    Ok(out)
}

#[cfg(unix)]
pub(crate) fn fsync_dir(dir: &Path) -> io::Result<()> {
    let f = File::open(dir)?;
    f.sync_all()
}

#[cfg(not(unix))]
pub(crate) fn fsync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn candidate_is_hidden_child_of_target() {
        let td = tempdir().unwrap();
        let p = staging_dir_candidate(td.path(), 0);
        assert_eq!(p.parent(), Some(td.path()));
        let name = p.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(STAGING_DIR_PREFIX), "{name}");
        let retry = staging_dir_candidate(td.path(), 3);
        assert!(retry.to_string_lossy().ends_with(".3"));
    }

    #[test]
    fn list_dir_missing_is_empty() {
        let td = tempdir().unwrap();
        assert!(list_dir(&td.path().join("gone")).unwrap().is_empty());
    }

    #[test]
    fn list_dir_sorted() {
        let td = tempdir().unwrap();
        fs::write(td.path().join("b"), b"").unwrap();
        fs::write(td.path().join("a"), b"").unwrap();
        let names: Vec<_> = list_dir(td.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
