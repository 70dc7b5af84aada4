pub mod file;
pub mod full;
pub mod hunk;
pub mod line;
mod patterns;

pub use file::DiffFile;
pub use full::{DEFAULT_SECTION_TITLE, DiffSection, ParsedDiff};
pub use hunk::DiffHunk;
pub use line::{DiffLine, LineKind};

/// Parse raw (possibly sectioned) diff text
pub fn parse_diff(text: &str) -> ParsedDiff {
    ParsedDiff::parse(text)
}

/// Format a parsed diff for reviewers, numbering every hunk and every line
/// offset so a selection can be quoted with `excerpt`.
///
/// Example output:
/// ```text
/// [Changes]
/// src/utils.js (+1 -0):
///   hunk 0
///     0: @@ -1,2 +1,3 @@
///     1:  // Utility functions
///     2: +export const x = 1;
/// ```
pub fn format_parsed_diff(diff: &ParsedDiff) -> String {
    let mut result = String::new();

    for section in diff.sections() {
        result.push_str(&format!("[{}]\n", section.title));

        for file in &section.files {
            let (adds, dels) = file.line_counts();
            result.push_str(&format!("{} (+{} -{}", file.display_path(), adds, dels));
            for (flag, label) in [
                (file.is_new, "new"),
                (file.is_deleted, "deleted"),
                (file.is_binary, "binary"),
            ] {
                if flag {
                    result.push_str(", ");
                    result.push_str(label);
                }
            }
            result.push_str("):\n");

            for (hunk_index, hunk) in file.hunks.iter().enumerate() {
                result.push_str(&format!("  hunk {}\n", hunk_index));
                for (offset, line) in hunk.lines.iter().enumerate() {
                    result.push_str(&format!("    {}: {}\n", offset, line));
                }
            }

            result.push('\n');
        }
    }

    // Remove trailing blank line if present
    if result.ends_with("\n\n") {
        result.pop();
    }

    result
}
