//! Line patterns shared by every parse.
//!
//! Compiled once on first use and read-only afterwards, so concurrent
//! parses share them freely.

#![allow(clippy::expect_used)]

use regex::Regex;
use std::sync::LazyLock;

/// Synthetic section marker: `# <title>`
pub(crate) static SECTION_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^# (.+)$").expect("Invalid section header regex"));

/// `diff --git a/<old> b/<new>`
pub(crate) static FILE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^diff --git a/(.+) b/(.+)$").expect("Invalid file header regex")
});

/// `--- a/<path>` or `--- /dev/null`
pub(crate) static OLD_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^--- (?:a/)?(.+)$").expect("Invalid old file regex"));

/// `+++ b/<path>` or `+++ /dev/null`
pub(crate) static NEW_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+\+\+ (?:b/)?(.+)$").expect("Invalid new file regex"));

/// Prefix of an untracked-file listing entry
pub(crate) const UNTRACKED_PREFIX: &str = "? ";

/// Prefix of git's binary file notice
pub(crate) const BINARY_PREFIX: &str = "Binary files";
