//! The seam between the rename engine and the filesystem.
//!
//! The engine never calls `fs::rename` directly: every relocation and every
//! existence check goes through a `Relocator`. `FsRelocator` performs the
//! operation; `DryRunRelocator` only records it, keeping an overlay of the
//! paths it has "moved" so existence checks see the simulated state.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::atomic::relocate_no_clobber;
use super::helpers::io_error_with_help_io;

pub trait Relocator {
    /// Move `from` to `to` without replacing an existing `to`.
    fn relocate(&mut self, from: &Path, to: &Path) -> io::Result<()>;

    /// Whether anything (file, dir, symlink) exists at `path`.
    fn exists(&self, path: &Path) -> io::Result<bool>;

    /// True when nothing is written to disk.
    fn is_simulated(&self) -> bool {
        false
    }
}

fn exists_on_disk(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FsRelocator;

impl Relocator for FsRelocator {
    fn relocate(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        relocate_no_clobber(from, to).map_err(io_error_with_help_io("relocate", from))
    }

    fn exists(&self, path: &Path) -> io::Result<bool> {
        exists_on_disk(path)
    }
}

/// Records relocations instead of performing them.
#[derive(Debug, Default)]
pub struct DryRunRelocator {
    vacated: HashSet<PathBuf>,
    occupied: HashSet<PathBuf>,
}

impl DryRunRelocator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Relocator for DryRunRelocator {
    fn relocate(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        if !self.exists(from)? {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("dry-run: source missing: {}", from.display()),
            ));
        }
        if self.exists(to)? {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("dry-run: destination exists: {}", to.display()),
            ));
        }
        self.occupied.remove(from);
        self.vacated.insert(from.to_path_buf());
        self.vacated.remove(to);
        self.occupied.insert(to.to_path_buf());
        Ok(())
    }

    fn exists(&self, path: &Path) -> io::Result<bool> {
        if self.occupied.contains(path) {
            return Ok(true);
        }
        if self.vacated.contains(path) {
            return Ok(false);
        }
        exists_on_disk(path)
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn dry_run_tracks_overlay_without_touching_disk() {
        let td = tempdir().unwrap();
        let a = td.path().join("a");
        let b = td.path().join("b");
        fs::write(&a, b"A").unwrap();

        let mut r = DryRunRelocator::new();
        r.relocate(&a, &b).unwrap();
        assert!(!r.exists(&a).unwrap());
        assert!(r.exists(&b).unwrap());
        assert!(a.exists(), "disk must be untouched");
        assert!(!b.exists(), "disk must be untouched");

        // Simulated swap back is allowed because `a` is vacated in the overlay.
        r.relocate(&b, &a).unwrap();
        assert!(r.exists(&a).unwrap());
    }

    #[test]
    fn dry_run_refuses_simulated_overwrite() {
        let td = tempdir().unwrap();
        let a = td.path().join("a");
        let b = td.path().join("b");
        fs::write(&a, b"A").unwrap();
        fs::write(&b, b"B").unwrap();
        let mut r = DryRunRelocator::new();
        let err = r.relocate(&a, &b).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn fs_relocator_moves() {
        let td = tempdir().unwrap();
        let a = td.path().join("a");
        let b = td.path().join("b");
        fs::write(&a, b"A").unwrap();
        let mut r = FsRelocator;
        r.relocate(&a, &b).unwrap();
        assert!(!r.exists(&a).unwrap());
        assert!(r.exists(&b).unwrap());
        assert!(!r.is_simulated());
    }
}
