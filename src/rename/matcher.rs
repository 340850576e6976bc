//! Pattern matching over one directory level.
//! Picks the entries named `<prefix><digits>.<extension>`; everything else in the
//! directory is left alone without complaint.

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use crate::errors::RenumberError;

use super::token::{NumericToken, TokenError, pad_index, parse_token};

/// `prefix + numeric token + "." + extension`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePattern {
    prefix: String,
    extension: String,
}

fn has_separator(s: &str) -> bool {
    s.contains('/') || s.contains('\\') || s.contains('\0')
}

impl NamePattern {
    /// Build a pattern. A single leading dot on the extension is dropped so that
    /// both `tif` and `.tif` work.
    pub fn new(prefix: impl Into<String>, extension: impl Into<String>) -> Result<Self, RenumberError> {
        let prefix = prefix.into();
        let extension = extension.into();
        let extension = extension.strip_prefix('.').unwrap_or(&extension).to_string();

        if has_separator(&prefix) {
            return Err(RenumberError::input(&prefix, "prefix must not contain a path separator"));
        }
        if extension.is_empty() {
            return Err(RenumberError::input(&extension, "extension must not be empty"));
        }
        if has_separator(&extension) {
            return Err(RenumberError::input(&extension, "extension must not contain a path separator"));
        }
        Ok(Self { prefix, extension })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Extract the numeric token from `name` if it has exactly this shape.
    pub fn token_of(&self, name: &str) -> Result<NumericToken, TokenError> {
        let rest = name.strip_prefix(self.prefix.as_str()).ok_or(TokenError::NotDigits)?;
        let digits = rest
            .strip_suffix(self.extension.as_str())
            .and_then(|r| r.strip_suffix('.'))
            .ok_or(TokenError::NotDigits)?;
        parse_token(digits)
    }

    /// Well-formed final name for `index` padded to `width` digits.
    pub fn final_name(&self, index: u64, width: usize) -> String {
        format!("{}{}.{}", self.prefix, pad_index(index, width), self.extension)
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<digits>.{}", self.prefix, self.extension)
    }
}

/// One matched directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub original_path: PathBuf,
    pub token: NumericToken,
}

impl FileEntry {
    pub fn numeric_value(&self) -> u64 {
        self.token.value
    }

    pub fn token_width(&self) -> usize {
        self.token.width()
    }

    /// File name of the original path (always UTF-8 for matched entries).
    pub fn file_name(&self) -> String {
        self.original_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Scan the direct children of `dir` and return every regular file matching
/// `pattern`, in file-name order. Fails with `NoMatch` when nothing matches.
pub fn scan(dir: &Path, pattern: &NamePattern) -> Result<Vec<FileEntry>, RenumberError> {
    let mut entries = Vec::new();

    for item in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let item = item.map_err(|e| {
            let reason = e
                .io_error()
                .map(|io| io.to_string())
                .unwrap_or_else(|| e.to_string());
            RenumberError::input(dir, format!("cannot list directory: {reason}"))
        })?;

        let Some(name) = item.file_name().to_str() else {
            trace!(path = %item.path().display(), "skipping non UTF-8 name");
            continue;
        };

        let token = match pattern.token_of(name) {
            Ok(t) => t,
            Err(TokenError::Overflow) => {
                warn!(name, "numeric token too large; entry ignored");
                continue;
            }
            Err(_) => {
                trace!(name, "not matching pattern");
                continue;
            }
        };

        if !item.file_type().is_file() {
            debug!(name, "name matches but entry is not a regular file; ignored");
            continue;
        }

        entries.push(FileEntry {
            original_path: item.into_path(),
            token,
        });
    }

    if entries.is_empty() {
        return Err(RenumberError::NoMatch {
            dir: dir.to_path_buf(),
            pattern: pattern.to_string(),
        });
    }
    debug!(count = entries.len(), pattern = %pattern, "matched entries");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn pat() -> NamePattern {
        NamePattern::new("a_", "tif").unwrap()
    }

    #[test]
    fn token_shape_is_strict() {
        let p = pat();
        assert_eq!(p.token_of("a_0001.tif").unwrap().value, 1);
        assert!(p.token_of("a_.tif").is_err());
        assert!(p.token_of("a_01.tiff").is_err());
        assert!(p.token_of("a_01.tif.bak").is_err());
        assert!(p.token_of("a_01x.tif").is_err());
        assert!(p.token_of("a_-1.tif").is_err());
        assert!(p.token_of("b_01.tif").is_err());
        assert!(p.token_of("a_01tif").is_err());
        assert!(p.token_of("a_01.TIF").is_err());
    }

    #[test]
    fn empty_prefix_is_allowed() {
        let p = NamePattern::new("", ".pdf").unwrap();
        assert_eq!(p.extension(), "pdf");
        assert_eq!(p.token_of("12.pdf").unwrap().value, 12);
        assert_eq!(p.final_name(3, 2), "03.pdf");
    }

    #[test]
    fn separators_rejected() {
        assert!(matches!(NamePattern::new("x/", "tif"), Err(RenumberError::Input { .. })));
        assert!(matches!(NamePattern::new("x", ""), Err(RenumberError::Input { .. })));
        assert!(matches!(NamePattern::new("x", "t/f"), Err(RenumberError::Input { .. })));
    }

    #[test]
    fn scan_ignores_unrelated_entries() {
        let td = tempdir().unwrap();
        for n in ["a_01.tif", "a_02.tif", "notes.txt", "a_03.jpg", "b_04.tif"] {
            fs::write(td.path().join(n), n).unwrap();
        }
        fs::create_dir(td.path().join("a_05.tif")).unwrap();
        let found = scan(td.path(), &pat()).unwrap();
        let names: Vec<_> = found.iter().map(FileEntry::file_name).collect();
        assert_eq!(names, vec!["a_01.tif", "a_02.tif"]);
    }

    #[test]
    fn scan_is_not_recursive() {
        let td = tempdir().unwrap();
        fs::create_dir(td.path().join("sub")).unwrap();
        fs::write(td.path().join("sub").join("a_01.tif"), b"").unwrap();
        let err = scan(td.path(), &pat()).unwrap_err();
        assert!(matches!(err, RenumberError::NoMatch { .. }));
    }
}
