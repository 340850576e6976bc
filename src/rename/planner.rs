//! Order planning: numeric sort, padding width and final names.
//! Pure computation; nothing here touches the filesystem.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::RenumberError;

use super::matcher::{FileEntry, NamePattern};
use super::token::digit_len;
use super::transform::IndexTransform;

/// Engine-facing unit of work: move `source` so that it ends up named
/// `final_name` in the target directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub final_name: String,
}

/// Immutable result of planning.
#[derive(Debug, Clone)]
pub struct RenamePlan {
    target_dir: PathBuf,
    pattern: NamePattern,
    transform: String,
    ordered: Vec<FileEntry>,
    final_names: Vec<String>,
    padding_width: usize,
}

impl RenamePlan {
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn pattern(&self) -> &NamePattern {
        &self.pattern
    }

    pub fn transform_name(&self) -> &str {
        &self.transform
    }

    /// Entries sorted ascending by numeric value.
    pub fn ordered_entries(&self) -> &[FileEntry] {
        &self.ordered
    }

    pub fn padding_width(&self) -> usize {
        self.padding_width
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Final name assigned to `entry`, if it is part of this plan.
    pub fn final_name_of(&self, entry: &FileEntry) -> Option<&str> {
        self.ordered
            .iter()
            .position(|e| e == entry)
            .map(|i| self.final_names[i].as_str())
    }

    /// (entry, final name) pairs in plan order.
    pub fn iter(&self) -> impl Iterator<Item = (&FileEntry, &str)> {
        self.ordered
            .iter()
            .zip(self.final_names.iter().map(String::as_str))
    }

    /// The moves the staging/commit protocol has to carry out, in plan order.
    pub fn moves(&self) -> Vec<PlannedMove> {
        self.iter()
            .map(|(e, name)| PlannedMove {
                source: e.original_path.clone(),
                final_name: name.to_string(),
            })
            .collect()
    }
}

/// Sort, check for duplicate indices, compute padding and derive final names.
pub fn plan(
    target_dir: &Path,
    pattern: &NamePattern,
    mut entries: Vec<FileEntry>,
    transform: &dyn IndexTransform,
) -> Result<RenamePlan, RenumberError> {
    // Stable sort; ties broken by name so duplicate reports are deterministic.
    entries.sort_by(|a, b| {
        a.numeric_value()
            .cmp(&b.numeric_value())
            .then_with(|| a.original_path.cmp(&b.original_path))
    });

    if let Some(err) = first_duplicate(&entries) {
        return Err(err);
    }

    let total = entries.len();
    let max_token = entries.iter().map(FileEntry::token_width).max().unwrap_or(0);
    let padding_width = digit_len(total as u64).max(max_token);

    let targets: Vec<usize> = (1..=total)
        .map(|pos| transform.target_index(pos, total))
        .collect();
    let mut seen = HashSet::with_capacity(total);
    if targets.iter().any(|&t| t == 0 || t > total || !seen.insert(t)) {
        return Err(RenumberError::InvalidTransform {
            transform: transform.name().to_string(),
            total,
        });
    }

    let final_names = targets
        .iter()
        .map(|&t| pattern.final_name(t as u64, padding_width))
        .collect();

    debug!(
        total,
        padding_width,
        transform = transform.name(),
        "plan computed"
    );

    Ok(RenamePlan {
        target_dir: target_dir.to_path_buf(),
        pattern: pattern.clone(),
        transform: transform.name().to_string(),
        ordered: entries,
        final_names,
        padding_width,
    })
}

/// Entries must already be sorted by value.
fn first_duplicate(entries: &[FileEntry]) -> Option<RenumberError> {
    let mut i = 0;
    while i < entries.len() {
        let value = entries[i].numeric_value();
        let run = entries[i..]
            .iter()
            .take_while(|e| e.numeric_value() == value)
            .count();
        if run > 1 {
            return Some(RenumberError::DuplicateIndex {
                value,
                names: entries[i..i + run].iter().map(FileEntry::file_name).collect(),
            });
        }
        i += run;
    }
    None
}
