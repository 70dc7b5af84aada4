use super::file::{DEV_NULL, DiffFile};
use super::hunk::DiffHunk;
use super::line::DiffLine;
use super::patterns::{
    BINARY_PREFIX, FILE_HEADER, NEW_FILE, OLD_FILE, SECTION_HEADER, UNTRACKED_PREFIX,
};
use log::debug;
use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};
use std::mem;

/// Title of the section that collects files seen before any `# <title>` marker
pub const DEFAULT_SECTION_TITLE: &str = "Changes";

/// A named group of files within one diff text (staged, unstaged, untracked...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffSection {
    pub title: String,
    pub files: Vec<DiffFile>,
}

impl DiffSection {
    pub fn new(title: &str) -> Self {
        DiffSection {
            title: title.to_string(),
            files: Vec::new(),
        }
    }
}

/// A complete diff text, split into sections of files.
///
/// Parsing never fails: unrecognized lines outside a hunk are ignored and
/// unrecognized lines inside one are dropped. There is always at least one
/// section; a text without any files yields a single empty
/// [`DEFAULT_SECTION_TITLE`] section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDiff {
    sections: Vec<DiffSection>,
}

impl ParsedDiff {
    /// Parse a (possibly sectioned) unified diff
    pub fn parse(text: &str) -> Self {
        let mut scanner = Scanner::new();
        for line in text.lines() {
            scanner.feed(line);
        }
        scanner.finish()
    }

    pub fn sections(&self) -> &[DiffSection] {
        &self.sections
    }

    /// All files of all sections, in order
    pub fn files(&self) -> impl Iterator<Item = &DiffFile> {
        self.sections.iter().flat_map(|section| section.files.iter())
    }

    /// First file whose new path (or, failing that, old path) is `path`
    pub fn file(&self, path: &str) -> Option<&DiffFile> {
        self.files()
            .find(|file| file.new_path == path)
            .or_else(|| self.files().find(|file| file.old_path == path))
    }
}

/// Serializes as `{ sections, files }`, with `files` flattened from the sections
impl Serialize for ParsedDiff {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ParsedDiff", 2)?;
        state.serialize_field("sections", &self.sections)?;
        state.serialize_field("files", &self.files().collect::<Vec<_>>())?;
        state.end()
    }
}

/// A hunk still receiving body lines, with its running line counters
struct OpenHunk {
    hunk: DiffHunk,
    old_line: u32,
    new_line: u32,
}

impl OpenHunk {
    fn new(hunk: DiffHunk) -> Self {
        OpenHunk {
            old_line: hunk.start_old,
            new_line: hunk.start_new,
            hunk,
        }
    }

    fn push_body(&mut self, line: &str) {
        let lines = &mut self.hunk.lines;
        if let Some(content) = line.strip_prefix('+') {
            lines.push(DiffLine::add(content, self.new_line));
            self.new_line = self.new_line.saturating_add(1);
        } else if let Some(content) = line.strip_prefix('-') {
            lines.push(DiffLine::del(content, self.old_line));
            self.old_line = self.old_line.saturating_add(1);
        } else if let Some(content) = line.strip_prefix(' ') {
            lines.push(DiffLine::context(content, self.old_line, self.new_line));
            self.old_line = self.old_line.saturating_add(1);
            self.new_line = self.new_line.saturating_add(1);
        } else if line.starts_with('\\') {
            lines.push(DiffLine::info(line));
        }
        // Anything else cannot appear in a well-formed hunk body
    }
}

/// A file still receiving header lines or hunks
struct OpenFile {
    file: DiffFile,
    hunk: Option<OpenHunk>,
}

impl OpenFile {
    fn new(file: DiffFile) -> Self {
        OpenFile { file, hunk: None }
    }

    fn start_hunk(&mut self, hunk: DiffHunk) {
        if let Some(previous) = self.hunk.replace(OpenHunk::new(hunk)) {
            self.file.hunks.push(previous.hunk);
        }
    }

    fn close(mut self) -> DiffFile {
        if let Some(open) = self.hunk.take() {
            self.file.hunks.push(open.hunk);
        }
        self.file
    }
}

struct OpenSection {
    section: DiffSection,
    file: Option<OpenFile>,
}

impl OpenSection {
    fn new(title: &str) -> Self {
        OpenSection {
            section: DiffSection::new(title),
            file: None,
        }
    }

    fn close_file(&mut self) {
        if let Some(open) = self.file.take() {
            self.section.files.push(open.close());
        }
    }

    fn close(mut self) -> DiffSection {
        self.close_file();
        self.section
    }
}

/// Single left-to-right pass over the diff lines
struct Scanner {
    closed: Vec<DiffSection>,
    current: OpenSection,
}

impl Scanner {
    fn new() -> Self {
        Scanner {
            closed: Vec::new(),
            current: OpenSection::new(DEFAULT_SECTION_TITLE),
        }
    }

    fn feed(&mut self, line: &str) {
        if let Some(caps) = SECTION_HEADER.captures(line) {
            debug!("section: {}", &caps[1]);
            let done = mem::replace(&mut self.current, OpenSection::new(&caps[1])).close();
            self.closed.push(done);
            return;
        }

        if let Some(path) = line.strip_prefix(UNTRACKED_PREFIX) {
            self.current.close_file();
            self.current.section.files.push(DiffFile::untracked(path));
            return;
        }

        if let Some(caps) = FILE_HEADER.captures(line) {
            self.current.close_file();
            self.current.file = Some(OpenFile::new(DiffFile::new(&caps[1], &caps[2])));
            return;
        }

        // Everything below belongs to a file
        let Some(open) = self.current.file.as_mut() else {
            return;
        };

        if let Some(caps) = OLD_FILE.captures(line) {
            if &caps[1] == DEV_NULL {
                open.file.is_new = true;
            }
            return;
        }

        if let Some(caps) = NEW_FILE.captures(line) {
            if &caps[1] == DEV_NULL {
                open.file.is_deleted = true;
            }
            return;
        }

        if line.starts_with(BINARY_PREFIX) {
            open.file.is_binary = true;
            return;
        }

        if let Some(hunk) = DiffHunk::parse_header(line) {
            open.start_hunk(hunk);
            return;
        }

        if let Some(hunk) = open.hunk.as_mut() {
            hunk.push_body(line);
        }
    }

    fn finish(self) -> ParsedDiff {
        let mut sections = self.closed;
        sections.push(self.current.close());
        sections.retain(|section| !section.files.is_empty());
        if sections.is_empty() {
            sections.push(DiffSection::new(DEFAULT_SECTION_TITLE));
        }

        debug!(
            "parsed {} section(s), {} file(s)",
            sections.len(),
            sections.iter().map(|s| s.files.len()).sum::<usize>()
        );

        ParsedDiff { sections }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::diff::line::LineKind;
    use proptest::prelude::*;
    use similar_asserts::assert_eq;

    const UTILS_DIFF: &str = r#"diff --git a/src/utils.js b/src/utils.js
--- a/src/utils.js
+++ b/src/utils.js
@@ -1,2 +1,6 @@
 // Utility functions
+export function multiply(a, b) {
+  return a * b;
+}
"#;

    fn titles(diff: &ParsedDiff) -> Vec<&str> {
        diff.sections().iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn parse_empty_diff() {
        let diff = ParsedDiff::parse("");
        assert_eq!(titles(&diff), vec!["Changes"]);
        assert_eq!(diff.files().count(), 0);
    }

    #[test]
    fn no_changes_notice_yields_default_section() {
        let diff = ParsedDiff::parse("# No changes detected in working tree");
        assert_eq!(titles(&diff), vec!["Changes"]);
        assert_eq!(diff.files().count(), 0);
    }

    #[test]
    fn parse_single_file() {
        let diff = ParsedDiff::parse(UTILS_DIFF);
        assert_eq!(titles(&diff), vec!["Changes"]);

        let files: Vec<_> = diff.files().collect();
        assert_eq!(files.len(), 1);
        let file = files[0];
        assert_eq!(file.old_path, "src/utils.js");
        assert_eq!(file.new_path, "src/utils.js");
        assert!(!file.is_new && !file.is_deleted && !file.is_binary);

        assert_eq!(file.hunks.len(), 1);
        let hunk = &file.hunks[0];
        assert_eq!(
            (hunk.start_old, hunk.count_old, hunk.start_new, hunk.count_new),
            (1, 2, 1, 6)
        );
        assert_eq!(
            hunk.lines,
            vec![
                DiffLine::hunk("@@ -1,2 +1,6 @@"),
                DiffLine::context("// Utility functions", 1, 1),
                DiffLine::add("export function multiply(a, b) {", 2),
                DiffLine::add("  return a * b;", 3),
                DiffLine::add("}", 4),
            ]
        );
    }

    #[test]
    fn counters_follow_mixed_body() {
        let text = "diff --git a/a.rs b/a.rs\n@@ -10,3 +20,3 @@\n keep\n-old\n+new\n keep\n";
        let diff = ParsedDiff::parse(text);
        let lines = &diff.files().next().unwrap().hunks[0].lines;
        assert_eq!(
            lines[1..].to_vec(),
            vec![
                DiffLine::context("keep", 10, 20),
                DiffLine::del("old", 11),
                DiffLine::add("new", 21),
                DiffLine::context("keep", 12, 22),
            ]
        );
    }

    #[test]
    fn multiple_hunks_restart_counters() {
        let text = "diff --git a/a.rs b/a.rs\n@@ -1 +1 @@\n-a\n+b\n@@ -40,2 +40 @@\n x\n-y\n";
        let diff = ParsedDiff::parse(text);
        let hunks = &diff.files().next().unwrap().hunks;
        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[1].lines[1], DiffLine::context("x", 40, 40));
        assert_eq!(hunks[1].lines[2], DiffLine::del("y", 41));
    }

    #[test]
    fn new_deleted_and_binary_files() {
        let text = r#"diff --git a/new.rs b/new.rs
new file mode 100644
index 0000000..abc1234
--- /dev/null
+++ b/new.rs
@@ -0,0 +1,2 @@
+fn hello() {}
+fn world() {}
diff --git a/gone.rs b/gone.rs
deleted file mode 100644
--- a/gone.rs
+++ /dev/null
@@ -1 +0,0 @@
-fn bye() {}
diff --git a/logo.png b/logo.png
Binary files a/logo.png and b/logo.png differ
"#;
        let diff = ParsedDiff::parse(text);
        let files: Vec<_> = diff.files().collect();
        assert_eq!(files.len(), 3);

        assert!(files[0].is_new && !files[0].is_deleted);
        assert_eq!(files[0].hunks[0].lines.len(), 3);

        assert!(files[1].is_deleted && !files[1].is_new);
        assert_eq!(files[1].hunks[0].lines[1], DiffLine::del("fn bye() {}", 1));

        assert!(files[2].is_binary);
        assert!(files[2].hunks.is_empty());
    }

    #[test]
    fn no_newline_marker_is_info() {
        let text = "diff --git a/a b/a\n@@ -1 +1 @@\n-x\n\\ No newline at end of file\n+y\n";
        let diff = ParsedDiff::parse(text);
        let lines = &diff.files().next().unwrap().hunks[0].lines;
        assert_eq!(lines[2], DiffLine::info("\\ No newline at end of file"));
        assert_eq!(lines[3], DiffLine::add("y", 1));
    }

    #[test]
    fn unrecognized_lines_inside_hunk_are_dropped() {
        let text = "diff --git a/a b/a\n@@ -1,2 +1,2 @@\n a\n\n b\n";
        let diff = ParsedDiff::parse(text);
        let lines = &diff.files().next().unwrap().hunks[0].lines;
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], DiffLine::context("b", 2, 2));
    }

    #[test]
    fn lines_before_any_file_are_ignored() {
        let text = "warning: something\n@@ -1 +1 @@\n+orphan\n--- a/x\n";
        let diff = ParsedDiff::parse(text);
        assert_eq!(diff.files().count(), 0);
    }

    #[test]
    fn untracked_file_entry() {
        let diff = ParsedDiff::parse("? src/math.js");
        let files: Vec<_> = diff.files().collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].is_new);
        assert_eq!(files[0].hunks.len(), 1);
        assert_eq!(files[0].hunks[0].header, "Untracked file");
        assert_eq!(files[0].hunks[0].lines.len(), 1);
        assert_eq!(files[0].hunks[0].lines[0].kind, LineKind::Info);
        assert_eq!(files[0].hunks[0].lines[0].content, "Untracked: src/math.js");
    }

    #[test]
    fn untracked_entry_closes_open_file() {
        let text = "diff --git a/a b/a\n@@ -1 +1 @@\n+x\n? b\n+not part of a\n";
        let diff = ParsedDiff::parse(text);
        let files: Vec<_> = diff.files().collect();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].hunks[0].lines.len(), 2);
        assert_eq!(files[1].new_path, "b");
    }

    #[test]
    fn sections_group_files() {
        let text = format!(
            "# Staged Changes\n{UTILS_DIFF}\n# Unstaged Changes\n{}\n# Untracked Files\n? src/math.js\n? notes.txt",
            UTILS_DIFF.replace("utils", "other")
        );
        let diff = ParsedDiff::parse(&text);
        assert_eq!(
            titles(&diff),
            vec!["Staged Changes", "Unstaged Changes", "Untracked Files"]
        );
        assert_eq!(diff.sections()[0].files[0].new_path, "src/utils.js");
        assert_eq!(diff.sections()[1].files[0].new_path, "src/other.js");
        assert_eq!(diff.sections()[2].files.len(), 2);

        let flattened: Vec<_> = diff.files().map(|f| f.new_path.as_str()).collect();
        assert_eq!(
            flattened,
            vec!["src/utils.js", "src/other.js", "src/math.js", "notes.txt"]
        );
    }

    #[test]
    fn files_before_first_marker_use_default_section() {
        let text = format!("{UTILS_DIFF}# Untracked Files\n? a.txt\n");
        let diff = ParsedDiff::parse(&text);
        assert_eq!(titles(&diff), vec!["Changes", "Untracked Files"]);
    }

    #[test]
    fn empty_sections_are_suppressed() {
        let text = "# Staged Changes\n# Unstaged Changes\n? a.txt\n# Trailing\n";
        let diff = ParsedDiff::parse(text);
        assert_eq!(titles(&diff), vec!["Unstaged Changes"]);
    }

    #[test]
    fn lookup_by_path() {
        let text = "diff --git a/old.rs b/new.rs\n@@ -1 +1 @@\n-a\n+b\n";
        let diff = ParsedDiff::parse(text);
        assert_eq!(diff.file("new.rs").unwrap().old_path, "old.rs");
        assert_eq!(diff.file("old.rs").unwrap().new_path, "new.rs");
        assert!(diff.file("missing.rs").is_none());
    }

    #[test]
    fn serializes_flattened_files() {
        let diff = ParsedDiff::parse("# Untracked Files\n? a.txt");
        let json = serde_json::to_value(&diff).unwrap();
        assert_eq!(json["sections"][0]["title"].as_str(), Some("Untracked Files"));
        assert_eq!(json["files"][0]["newPath"].as_str(), Some("a.txt"));
        assert_eq!(json["files"][0]["isNew"].as_bool(), Some(true));
        assert_eq!(
            json["files"][0]["hunks"][0]["lines"][0]["kind"].as_str(),
            Some("info")
        );
    }

    fn arb_body_line() -> impl Strategy<Value = String> {
        (prop_oneof![Just('+'), Just('-'), Just(' ')], "[a-z ]{0,12}")
            .prop_map(|(prefix, text)| format!("{prefix}{text}"))
    }

    fn arb_file() -> impl Strategy<Value = String> {
        (
            "[a-z]{1,8}",
            prop::collection::vec((1u32..500, prop::collection::vec(arb_body_line(), 1..8)), 1..4),
        )
            .prop_map(|(name, hunks)| {
                let mut text = format!("diff --git a/{name}.rs b/{name}.rs\n");
                for (start, body) in hunks {
                    let count = body.len();
                    text.push_str(&format!("@@ -{start},{count} +{start},{count} @@\n"));
                    for line in body {
                        text.push_str(&line);
                        text.push('\n');
                    }
                }
                text
            })
    }

    proptest! {
        #[test]
        fn parse_is_idempotent(files in prop::collection::vec(arb_file(), 0..4)) {
            let text = files.concat();
            prop_assert_eq!(ParsedDiff::parse(&text), ParsedDiff::parse(&text));
        }

        #[test]
        fn every_body_line_is_kept(file in arb_file()) {
            let body_lines = file
                .lines()
                .filter(|line| !line.starts_with("diff --git") && !line.starts_with("@@"))
                .count();
            let diff = ParsedDiff::parse(&file);
            let parsed: usize = diff
                .files()
                .flat_map(|f| f.hunks.iter())
                .map(|h| h.lines.len() - 1)
                .sum();
            prop_assert_eq!(parsed, body_lines);
        }
    }
}
