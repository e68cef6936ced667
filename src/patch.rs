use std::fmt;
use std::io::Write;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use crate::PatchFileError;
use crate::diff::{file_header, parse_hunks};

/// Zero-based, inclusive range of new-side lines in the current file content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    pub start: u32,
    pub end: u32,
}

impl SelectionRange {
    /// Returns `None` when `start > end`.
    pub fn new(start: u32, end: u32) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Build from one-based editor line numbers
    pub fn from_one_based(start: NonZeroU32, end: NonZeroU32) -> Option<Self> {
        Self::new(start.get() - 1, end.get() - 1)
    }
}

impl fmt::Display for SelectionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Standalone unified-diff text ending in exactly one newline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch(String);

impl Patch {
    /// Wrap a full diff (e.g. `git diff --cached`) as a patch.
    ///
    /// Returns `None` if the diff is blank.
    pub fn from_diff(diff: &str) -> Option<Self> {
        if diff.trim().is_empty() {
            return None;
        }
        let mut text = diff.to_string();
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Some(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build a patch from the hunks of `diff` that touch `selection`.
///
/// The file header is the first four lines of `diff`, copied as-is. Selected
/// hunks follow in their original order, untouched. Returns `None` when no hunk
/// overlaps the selection.
///
/// # Examples
///
/// ```
/// use git_partial_pr::patch::{SelectionRange, extract_patch_for_selection};
///
/// let diff = "diff --git a/f b/f\nindex 1..2 100644\n--- a/f\n+++ b/f\n\
///             @@ -1 +1 @@\n-a\n+b\n@@ -9 +9 @@\n-c\n+d\n";
///
/// let patch = extract_patch_for_selection(diff, SelectionRange::new(8, 8).unwrap()).unwrap();
/// assert_eq!(
///     patch.as_str(),
///     "diff --git a/f b/f\nindex 1..2 100644\n--- a/f\n+++ b/f\n@@ -9 +9 @@\n-c\n+d\n"
/// );
///
/// assert!(extract_patch_for_selection(diff, SelectionRange::new(4, 5).unwrap()).is_none());
/// ```
pub fn extract_patch_for_selection(diff: &str, selection: SelectionRange) -> Option<Patch> {
    let selected: Vec<_> = parse_hunks(diff)
        .into_iter()
        .filter(|hunk| hunk.overlaps(&selection))
        .collect();

    if selected.is_empty() {
        return None;
    }

    let mut text = file_header(diff).to_string();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    for hunk in &selected {
        text.push_str(&hunk.text);
        if !text.ends_with('\n') {
            text.push('\n');
        }
    }

    Some(Patch(text))
}

/// A patch written to a uniquely named temporary file.
///
/// Dropping it deletes the file; [`PatchFile::remove`] does the same but
/// reports failure, and [`PatchFile::keep`] leaves it on disk.
#[derive(Debug)]
pub struct PatchFile {
    path: TempPath,
}

impl PatchFile {
    pub fn create(patch: &Patch) -> Result<Self, PatchFileError> {
        let mut file = tempfile::Builder::new()
            .prefix("git-partial-pr-")
            .suffix(".patch")
            .tempfile()
            .map_err(|e| PatchFileError::CreateFailed {
                message: e.to_string(),
            })?;

        file.write_all(patch.as_str().as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| PatchFileError::WriteFailed {
                path: file.path().display().to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remove(self) -> Result<(), PatchFileError> {
        let path = self.path.display().to_string();
        self.path
            .close()
            .map_err(|e| PatchFileError::RemoveFailed {
                path,
                message: e.to_string(),
            })
    }

    pub fn keep(self) -> Result<PathBuf, PatchFileError> {
        let path = self.path.display().to_string();
        self.path.keep().map_err(|e| PatchFileError::KeepFailed {
            path,
            message: e.to_string(),
        })
    }
}
