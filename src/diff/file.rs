use super::hunk::DiffHunk;
use serde::Serialize;

/// Path git prints in place of a missing side of a diff
pub const DEV_NULL: &str = "/dev/null";

/// A complete diff for a single file.
///
/// A file may legitimately have no hunks (binary files, pure mode changes)
/// or a single synthetic hunk when it is an untracked placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffFile {
    pub old_path: String,
    pub new_path: String,
    pub hunks: Vec<DiffHunk>,
    pub is_new: bool,
    pub is_deleted: bool,
    pub is_binary: bool,
}

impl DiffFile {
    /// Start a file from the paths of a `diff --git a/<old> b/<new>` header
    pub fn new(old_path: &str, new_path: &str) -> Self {
        DiffFile {
            old_path: old_path.to_string(),
            new_path: new_path.to_string(),
            hunks: Vec::new(),
            is_new: false,
            is_deleted: false,
            is_binary: false,
        }
    }

    /// Complete placeholder for a `? <path>` listing entry
    pub fn untracked(path: &str) -> Self {
        DiffFile {
            hunks: vec![DiffHunk::untracked(path)],
            is_new: true,
            ..DiffFile::new(path, path)
        }
    }

    /// Path to show for this file: the new path, or the old one once deleted
    pub fn display_path(&self) -> &str {
        if self.is_deleted {
            &self.old_path
        } else {
            &self.new_path
        }
    }

    /// Offset of `line_index` within hunk `hunk_index` when all hunks of the
    /// file are laid out back to back.
    ///
    /// Hunk indices past the end count every hunk of the file.
    pub fn global_line_index(&self, hunk_index: usize, line_index: usize) -> usize {
        self.hunks
            .iter()
            .take(hunk_index)
            .map(|hunk| hunk.lines.len())
            .sum::<usize>()
            + line_index
    }

    /// Count of (added, deleted) lines across all hunks
    pub fn line_counts(&self) -> (usize, usize) {
        self.hunks.iter().fold((0, 0), |(adds, dels), hunk| {
            let (a, d) = hunk.line_counts();
            (adds + a, dels + d)
        })
    }
}
