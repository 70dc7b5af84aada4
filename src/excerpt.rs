//! Canonical excerpt text for a selection inside one hunk.

use crate::diff::DiffFile;

/// Quote lines `start_line..=end_line` of hunk `hunk_index` of `file`.
///
/// Offsets index `hunk.lines`, where offset 0 is the hunk marker itself.
/// Each quoted line is its excerpt prefix (`+`, `-` or a space) followed by
/// its content, joined with `\n`. Offsets past the end of the hunk are
/// skipped, so an overrunning range yields a shorter excerpt. An unknown
/// hunk or an inverted range yields the empty string, which never counts
/// as fresh.
///
/// # Examples
///
/// ```
/// use diff_anchors::diff::parse_diff;
/// use diff_anchors::excerpt::extract_excerpt;
///
/// let diff = parse_diff("diff --git a/a.rs b/a.rs\n@@ -1 +1,2 @@\n fn a() {}\n+fn b() {}\n");
/// let file = diff.file("a.rs").unwrap();
/// assert_eq!(extract_excerpt(file, 0, 1, 2), " fn a() {}\n+fn b() {}");
/// assert_eq!(extract_excerpt(file, 3, 1, 2), "");
/// ```
pub fn extract_excerpt(
    file: &DiffFile,
    hunk_index: usize,
    start_line: usize,
    end_line: usize,
) -> String {
    let Some(hunk) = file.hunks.get(hunk_index) else {
        return String::new();
    };
    if start_line > end_line {
        return String::new();
    }

    hunk.lines
        .iter()
        .skip(start_line)
        .take((end_line - start_line).saturating_add(1))
        .map(|line| format!("{}{}", line.prefix(), line.content))
        .collect::<Vec<_>>()
        .join("\n")
}
