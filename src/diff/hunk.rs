use super::line::{DiffLine, LineKind};
use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::{char, digit1},
    combinator::{map_res, opt},
    sequence::preceded,
};
use serde::Serialize;
use std::fmt;

/// Header text of the synthetic hunk carried by untracked files
pub const UNTRACKED_HUNK_HEADER: &str = "Untracked file";

/// A single hunk from a unified diff.
///
/// `lines[0]` is always the hunk marker itself, so integer offsets into
/// `lines` address the same rows a reviewer selects in a rendered diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffHunk {
    pub header: String,
    pub start_old: u32,
    pub count_old: u32,
    pub start_new: u32,
    pub count_new: u32,
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    /// Open a hunk from its `@@ -a[,b] +c[,d] @@` header line.
    ///
    /// The returned hunk holds only the marker line. Missing counts default
    /// to 1. Returns `None` if the line is not a hunk header.
    pub fn parse_header(line: &str) -> Option<Self> {
        let (_, (old, new)) = hunk_ranges(line).ok()?;

        Some(DiffHunk {
            header: line.to_string(),
            start_old: old.0,
            count_old: old.1,
            start_new: new.0,
            count_new: new.1,
            lines: vec![DiffLine::hunk(line)],
        })
    }

    /// Placeholder hunk for a file git does not track yet
    pub fn untracked(path: &str) -> Self {
        DiffHunk {
            header: UNTRACKED_HUNK_HEADER.to_string(),
            start_old: 0,
            count_old: 0,
            start_new: 0,
            count_new: 0,
            lines: vec![DiffLine::info(&format!("Untracked: {path}"))],
        }
    }

    /// Count of (added, deleted) lines
    pub fn line_counts(&self) -> (usize, usize) {
        self.lines.iter().fold((0, 0), |(adds, dels), line| match line.kind {
            LineKind::Add => (adds + 1, dels),
            LineKind::Del => (adds, dels + 1),
            _ => (adds, dels),
        })
    }
}

impl fmt::Display for DiffHunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

fn number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |digits: &str| digits.parse::<u32>()).parse(input)
}

/// `start` or `start,count`
fn range(input: &str) -> IResult<&str, (u32, u32)> {
    let (input, start) = number(input)?;
    let (input, count) = opt(preceded(char(','), number)).parse(input)?;
    Ok((input, (start, count.unwrap_or(1))))
}

/// `@@ -a[,b] +c[,d] @@`, leaving any trailing section heading unparsed
fn hunk_ranges(input: &str) -> IResult<&str, ((u32, u32), (u32, u32))> {
    let (input, old) = preceded(tag("@@ -"), range).parse(input)?;
    let (input, new) = preceded(tag(" +"), range).parse(input)?;
    let (input, _) = tag(" @@").parse(input)?;
    Ok((input, (old, new)))
}
