//! Review anchors and staleness detection.
//!
//! An [`Anchor`] freezes the excerpt a comment was written against. On every
//! diff refresh the excerpt is searched for in the whole new diff text; the
//! stored hunk and line offsets are only a rendering hint and never decide
//! freshness, so hunks drifting by a few lines do not mark comments stale.

use crate::diff::ParsedDiff;
use crate::excerpt::extract_excerpt;
use log::debug;
use serde::{Deserialize, Serialize};

/// Normalized excerpts shorter than this are always stale: they match by
/// coincidence too easily.
pub const MIN_EXCERPT_LEN: usize = 20;

/// A comment's reference into a diff.
///
/// `excerpt` never changes after capture; `stale` is the only field a
/// refresh updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anchor {
    pub file_path: String,
    pub hunk_index: usize,
    pub start_line: usize,
    pub end_line: usize,
    pub excerpt: String,
    #[serde(default)]
    pub stale: bool,
}

impl Anchor {
    /// Anchor a selection of `diff`, freezing its excerpt.
    ///
    /// Returns `None` if no file in the diff has `file_path` as its new or
    /// old path.
    pub fn capture(
        diff: &ParsedDiff,
        file_path: &str,
        hunk_index: usize,
        start_line: usize,
        end_line: usize,
    ) -> Option<Self> {
        let file = diff.file(file_path)?;
        Some(Anchor {
            file_path: file_path.to_string(),
            hunk_index,
            start_line,
            end_line,
            excerpt: extract_excerpt(file, hunk_index, start_line, end_line),
            stale: false,
        })
    }
}

/// Trim every line and drop the blank ones, so indentation and trailing
/// whitespace churn between refreshes does not matter.
pub fn normalize_excerpt(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Staleness checks against one diff text, normalized once
#[derive(Debug, Clone)]
pub struct StalenessChecker {
    normalized_diff: String,
}

impl StalenessChecker {
    pub fn new(diff_text: &str) -> Self {
        StalenessChecker {
            normalized_diff: normalize_excerpt(diff_text),
        }
    }

    /// Whether `excerpt` can no longer be trusted to exist in the diff
    pub fn is_excerpt_stale(&self, excerpt: &str) -> bool {
        let excerpt = normalize_excerpt(excerpt);
        if excerpt.chars().count() < MIN_EXCERPT_LEN {
            return true;
        }
        !self.normalized_diff.contains(&excerpt)
    }

    pub fn is_stale(&self, anchor: &Anchor) -> bool {
        let stale = self.is_excerpt_stale(&anchor.excerpt);
        debug!(
            "anchor {}#{}[{}..={}] stale={}",
            anchor.file_path, anchor.hunk_index, anchor.start_line, anchor.end_line, stale
        );
        stale
    }
}

/// Whether `anchor`'s excerpt is missing from `diff_text`
pub fn is_stale(anchor: &Anchor, diff_text: &str) -> bool {
    StalenessChecker::new(diff_text).is_stale(anchor)
}

/// Outcome of re-checking a set of anchors against a fresh diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StalenessReport {
    /// Every input anchor, in input order, with its current stale flag
    pub updated: Vec<Anchor>,
    /// Anchors that are stale now
    pub stale_count: usize,
    /// Indices into `updated` whose stale flag flipped
    pub changed: Vec<usize>,
}

/// Re-check every anchor against `diff_text`.
///
/// Each anchor is judged on its own, so input order never affects a
/// verdict. Only anchors whose flag actually flips are listed in
/// [`StalenessReport::changed`].
pub fn check_all(anchors: &[Anchor], diff_text: &str) -> StalenessReport {
    let checker = StalenessChecker::new(diff_text);
    let mut changed = Vec::new();

    let updated: Vec<Anchor> = anchors
        .iter()
        .enumerate()
        .map(|(index, anchor)| {
            let stale = checker.is_stale(anchor);
            if stale != anchor.stale {
                changed.push(index);
            }
            Anchor {
                stale,
                ..anchor.clone()
            }
        })
        .collect();

    let stale_count = updated.iter().filter(|anchor| anchor.stale).count();

    StalenessReport {
        updated,
        stale_count,
        changed,
    }
}
