//! Advisory directory lock.
//! Keeps two renumber processes from operating on the same directory at once.
//!
//! Design:
//! - We lock by opening/holding a file `.renumber.lock` inside the target directory.
//! - fs2 maps the exclusive lock onto flock(LOCK_EX) on Unix and LockFileEx on Windows.
//! - Acquisition never blocks: a held lock is reported to the caller immediately.
//!
//! Notes:
//! - The lock is released when the DirLock guard is dropped. The file name is
//!   unlinked while the lock is still held, and a freshly locked handle is only
//!   accepted if the name still points at it, so a lock taken on an unlinked
//!   inode is never mistaken for the directory lock.
//! - The lock is advisory: processes that are not renumber ignore it.

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::trace;

pub const LOCK_FILE_NAME: &str = ".renumber.lock";

/// RAII guard held while a directory-level lock is active.
#[derive(Debug)]
pub struct DirLock {
    file: File,
    path: PathBuf,
}

impl DirLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        // Unlink first: anyone who opened the old inode will see it unlinked.
        let _ = std::fs::remove_file(&self.path);
        let _ = FileExt::unlock(&self.file);
    }
}

fn lock_file_path(dir: &Path) -> PathBuf {
    dir.join(LOCK_FILE_NAME)
}

/// Attempts before giving up on a lock file that keeps being replaced.
const MAX_ATTEMPTS: usize = 8;

/// True if `path` still names the inode `file` was opened on.
#[cfg(unix)]
fn still_linked(file: &File, path: &Path) -> io::Result<bool> {
    use std::os::unix::fs::MetadataExt;
    let held = file.metadata()?;
    match fs::metadata(path) {
        Ok(named) => Ok(held.dev() == named.dev() && held.ino() == named.ino()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// A delete-pending file cannot be reopened on Windows; existence is enough.
#[cfg(not(unix))]
fn still_linked(_file: &File, path: &Path) -> io::Result<bool> {
    Ok(fs::metadata(path).is_ok())
}

/// Try to acquire an exclusive lock for `dir` without blocking.
/// Returns Ok(None) if another process holds it.
pub fn try_acquire_dir_lock(dir: &Path) -> io::Result<Option<DirLock>> {
    let lock_path = lock_file_path(dir);
    for _ in 0..MAX_ATTEMPTS {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                if still_linked(&file, &lock_path)? {
                    trace!(path = %lock_path.display(), "try-lock success");
                    return Ok(Some(DirLock {
                        file,
                        path: lock_path,
                    }));
                }
                // Previous holder unlinked it between our open and our lock.
                trace!(path = %lock_path.display(), "lock file replaced; retrying");
            }
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                trace!(path = %lock_path.display(), "try-lock would block");
                return Ok(None);
            }
            Err(e) => return Err(e),
        }
    }
    trace!(path = %lock_path.display(), "lock file kept changing; treating as held");
    Ok(None)
}
