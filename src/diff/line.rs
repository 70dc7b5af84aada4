use serde::Serialize;
use std::fmt;

/// Classification of a single line inside a hunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Unchanged line present in both versions
    Context,
    /// Line only present in the new version
    Add,
    /// Line only present in the old version
    Del,
    /// File-level header text
    Header,
    /// The `@@ ... @@` marker that opens a hunk
    Hunk,
    /// Annotation without line numbers (`\ No newline at end of file`, untracked placeholders)
    Info,
}

/// A single line of a parsed hunk.
///
/// Line numbers follow the running counters of the enclosing hunk header:
/// context lines carry both, additions only `new_line_number`, deletions only
/// `old_line_number`, everything else neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffLine {
    pub kind: LineKind,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_line_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_line_number: Option<u32>,
}

impl DiffLine {
    fn unnumbered(kind: LineKind, content: &str) -> Self {
        Self {
            kind,
            content: content.to_string(),
            old_line_number: None,
            new_line_number: None,
        }
    }

    /// The `@@ ... @@` marker line, always first in a hunk
    pub fn hunk(header: &str) -> Self {
        Self::unnumbered(LineKind::Hunk, header)
    }

    pub fn info(content: &str) -> Self {
        Self::unnumbered(LineKind::Info, content)
    }

    pub fn add(content: &str, new_line: u32) -> Self {
        Self {
            new_line_number: Some(new_line),
            ..Self::unnumbered(LineKind::Add, content)
        }
    }

    pub fn del(content: &str, old_line: u32) -> Self {
        Self {
            old_line_number: Some(old_line),
            ..Self::unnumbered(LineKind::Del, content)
        }
    }

    pub fn context(content: &str, old_line: u32, new_line: u32) -> Self {
        Self {
            old_line_number: Some(old_line),
            new_line_number: Some(new_line),
            ..Self::unnumbered(LineKind::Context, content)
        }
    }

    /// Single-character prefix used when quoting this line in an excerpt.
    ///
    /// Anything that is neither an addition nor a deletion quotes as a space.
    pub fn prefix(&self) -> char {
        match self.kind {
            LineKind::Add => '+',
            LineKind::Del => '-',
            _ => ' ',
        }
    }
}

/// Renders the line as it appeared in the diff text
impl fmt::Display for DiffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LineKind::Context | LineKind::Add | LineKind::Del => {
                write!(f, "{}{}", self.prefix(), self.content)
            }
            LineKind::Header | LineKind::Hunk | LineKind::Info => f.write_str(&self.content),
        }
    }
}
