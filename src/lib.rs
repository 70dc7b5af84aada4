use error_set::error_set;
use log::info;
use std::path::Path;
use std::process::Command;

pub mod anchor;
pub mod diff;
pub mod excerpt;

pub use anchor::{Anchor, MIN_EXCERPT_LEN, StalenessChecker, StalenessReport, check_all, is_stale};
pub use diff::{DiffFile, DiffHunk, DiffLine, DiffSection, LineKind, ParsedDiff, parse_diff};
pub use excerpt::extract_excerpt;

error_set! {
    /// Top-level error for diff-anchors operations
    DiffAnchorsError := {
        #[display("Failed to access {path}: {message}")]
        Io { path: String, message: String },
        #[display("JSON error: {message}")]
        Json { message: String },
        #[display("No file {path} in diff")]
        FileNotInDiff { path: String },
    } || GitCommandError

    /// Errors from git command execution
    GitCommandError := {
        #[display("Not a git repository: {path}")]
        NotARepository { path: String },
        #[display("Failed to run git {command}: {message}")]
        SpawnFailed { command: String, message: String },
        #[display("git {command} failed: {stderr}")]
        ExitError { command: String, stderr: String },
        #[display("Invalid UTF-8 in git {command} output: {message}")]
        InvalidUtf8 { command: String, message: String },
    }
}

/// Section titles of the collected working-tree diff
pub const STAGED_SECTION: &str = "Staged Changes";
pub const UNSTAGED_SECTION: &str = "Unstaged Changes";
pub const UNTRACKED_SECTION: &str = "Untracked Files";

/// Diff text reported for a clean working tree
pub const NO_CHANGES: &str = "# No changes detected in working tree";

/// `git diff` flags that keep the output parseable regardless of user config
const DIFF_ARGS: &[&str] = &[
    "diff",
    "--no-ext-diff",
    "--no-color",
    "--src-prefix=a/",
    "--dst-prefix=b/",
];

/// Collects the reviewable diff of a repository's working tree
pub struct WorkingTree<'a> {
    repo_path: &'a str,
}

impl<'a> WorkingTree<'a> {
    /// Create a collector for the repository at `repo_path`
    pub fn new(repo_path: &'a str) -> Self {
        Self { repo_path }
    }

    /// Whether `repo_path` exists and is inside a git work tree
    pub fn is_git_repo(&self) -> bool {
        Path::new(self.repo_path).exists() && self.git(&["rev-parse", "--git-dir"]).is_ok()
    }

    /// Sectioned diff text of staged, unstaged and untracked changes
    ///
    /// # Examples
    /// ```no_run
    /// # use diff_anchors::{WorkingTree, parse_diff};
    /// let text = WorkingTree::new(".").diff_text().unwrap();
    /// let diff = parse_diff(&text);
    /// ```
    pub fn diff_text(&self) -> Result<String, GitCommandError> {
        if !self.is_git_repo() {
            return Err(GitCommandError::NotARepository {
                path: self.repo_path.to_string(),
            });
        }

        let mut cached = DIFF_ARGS.to_vec();
        cached.push("--cached");

        let staged = self.git(&cached)?;
        let unstaged = self.git(DIFF_ARGS)?;
        let untracked = self.git(&["ls-files", "--others", "--exclude-standard"])?;

        Ok(assemble_sections(&staged, &unstaged, &untracked))
    }

    /// Parsed form of [`WorkingTree::diff_text`]
    pub fn parse(&self) -> Result<ParsedDiff, GitCommandError> {
        Ok(parse_diff(&self.diff_text()?))
    }

    /// Collect the current diff and re-check `anchors` against it
    pub fn refresh(&self, anchors: &[Anchor]) -> Result<StalenessReport, GitCommandError> {
        let report = check_all(anchors, &self.diff_text()?);
        if report.stale_count > 0 {
            info!(
                "{} anchor(s) stale in {} ({} changed)",
                report.stale_count,
                self.repo_path,
                report.changed.len()
            );
        }
        Ok(report)
    }

    /// Run git in the repository and return its stdout
    fn git(&self, args: &[&str]) -> Result<String, GitCommandError> {
        let command = args.join(" ");

        let output = Command::new("git")
            .arg("-C")
            .arg(self.repo_path)
            .args(args)
            .output()
            .map_err(|e| GitCommandError::SpawnFailed {
                command: command.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitCommandError::ExitError {
                command,
                stderr: stderr.trim_end().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| GitCommandError::InvalidUtf8 {
            command,
            message: e.to_string(),
        })
    }
}

/// Join the three git outputs into one sectioned diff text.
///
/// Empty parts are left out; a tree with no changes at all yields
/// [`NO_CHANGES`].
pub fn assemble_sections(staged: &str, unstaged: &str, untracked: &str) -> String {
    let mut output = String::new();

    if !staged.is_empty() {
        output.push_str(&format!("# {STAGED_SECTION}\n{staged}"));
    }

    if !unstaged.is_empty() {
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&format!("# {UNSTAGED_SECTION}\n{unstaged}"));
    }

    let untracked = untracked.trim();
    if !untracked.is_empty() {
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&format!("# {UNTRACKED_SECTION}\n"));
        let entries: Vec<String> = untracked.lines().map(|path| format!("? {path}")).collect();
        output.push_str(&entries.join("\n"));
    }

    if output.is_empty() {
        output.push_str(NO_CHANGES);
    }

    output
}
