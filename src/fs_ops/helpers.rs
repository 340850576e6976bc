//! I/O error enrichment.
//!
//! Relocation failures end up in front of an operator who has to repair a
//! half-finished run by hand, so every io::Error leaving this crate carries the
//! operation, the path and, where we recognise the cause, a short hint.
//!
//! Usage:
//!   fs::rename(a, b).map_err(io_error_with_help_io("stage file", a))?;
//!   File::open(p).map_err(io_error_with_help("open transcript", p))?; // anyhow

use anyhow::anyhow;
use std::io;
use std::path::Path;

/// Platform-aware hint keyed on the raw OS error code.
fn os_hint(code: i32) -> Option<&'static str> {
    #[cfg(unix)]
    {
        match code {
            libc::EACCES | libc::EPERM => Some("permission denied; check ownership and write permissions"),
            libc::EXDEV => Some("cross-filesystem; the staging area must live on the same volume"),
            libc::EBUSY => Some("resource busy; ensure no other process is using the file"),
            libc::ENOENT => Some("path not found; the file may have been moved by another process"),
            libc::EEXIST | libc::ENOTEMPTY => Some("already exists; refusing to overwrite"),
            libc::ENOSPC => Some("insufficient space on device"),
            libc::EROFS => Some("read-only filesystem"),
            libc::ENAMETOOLONG => Some("filename or path too long"),
            _ => None,
        }
    }
    #[cfg(windows)]
    {
        match code {
            5 => Some("access denied; check permissions"),
            17 => Some("not same device; the staging area must live on the same volume"),
            32 => Some("sharing violation; file is in use"),
            2 | 3 => Some("path not found; the file may have been moved by another process"),
            80 | 183 => Some("already exists; refusing to overwrite"),
            112 => Some("insufficient disk space"),
            _ => None,
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = code;
        None
    }
}

fn kind_hint(kind: io::ErrorKind) -> Option<&'static str> {
    match kind {
        io::ErrorKind::PermissionDenied => Some("permission denied; check ownership and write permissions"),
        io::ErrorKind::NotFound => Some("path not found; verify it exists"),
        io::ErrorKind::AlreadyExists => Some("already exists; refusing to overwrite"),
        _ => None,
    }
}

/// Format "<op> '<path>': <error>; <hint> [os code: N]".
fn build_message(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);
    let hint = match e.raw_os_error() {
        Some(code) => os_hint(code),
        None => kind_hint(e.kind()),
    };
    if let Some(h) = hint {
        msg.push_str("; ");
        msg.push_str(h);
    }
    if let Some(code) = e.raw_os_error() {
        msg.push_str(&format!(" [os code: {code}]"));
    }
    msg
}

/// Adapter for anyhow::Result code.
pub fn io_error_with_help<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> anyhow::Error + 'a {
    move |e: io::Error| anyhow!(build_message(op, path, &e))
}

/// Adapter for io::Result code; keeps the original ErrorKind.
pub fn io_error_with_help_io<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> io::Error + 'a {
    move |e: io::Error| io::Error::new(e.kind(), build_message(op, path, &e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_contains_op_path_and_hint() {
        let e = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        let wrapped = io_error_with_help_io("stage file", Path::new("/data/a_01.tif"))(e);
        assert_eq!(wrapped.kind(), io::ErrorKind::PermissionDenied);
        let msg = wrapped.to_string();
        assert!(msg.contains("stage file '/data/a_01.tif'"), "{msg}");
        assert!(msg.contains("permission denied"), "{msg}");
    }

    #[cfg(unix)]
    #[test]
    fn raw_os_code_is_reported() {
        let e = io::Error::from_raw_os_error(libc::ENOSPC);
        let msg = io_error_with_help("commit file", Path::new("/x"))(e).to_string();
        assert!(msg.contains("insufficient space"), "{msg}");
        assert!(msg.contains(&format!("[os code: {}]", libc::ENOSPC)), "{msg}");
    }
}
