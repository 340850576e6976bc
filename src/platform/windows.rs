use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

/// Open `path` for appending, creating it (and its parent) when missing.
/// No ACL changes are made.
pub fn open_log_file_secure_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
