//! Git commit walker producing the raw records for the daily report
//!
//! Extracts everything the report needs from each commit:
//! - Chronological walking (oldest to newest)
//! - Author and date-range filtering
//! - Diff statistics (insertions, deletions)
//! - Unified patch text against the first parent

use crate::error::{Error, GitError, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use git2::{DiffFormat, DiffOptions, Repository, Revwalk, Sort};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Accepted format for `--start-date` / `--end-date`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single commit as seen by the report. Never mutated after extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Full SHA hash
    pub hash: String,
    /// Author name and email
    pub author: String,
    /// Author email, used for filtering
    pub author_email: String,
    /// Author timestamp
    pub timestamp: DateTime<Utc>,
    /// Full commit message
    pub message: String,
    /// Lines inserted
    pub lines_added: u64,
    /// Lines deleted
    pub lines_deleted: u64,
    /// Unified patch text
    pub diff: String,
}

/// Options for walking commits
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Only keep commits whose author email matches (case-insensitive)
    pub author: Option<String>,
    /// Inclusive start day, `YYYY-MM-DD`; malformed values are ignored
    pub start_date: Option<String>,
    /// Inclusive end day, `YYYY-MM-DD`; malformed values are ignored
    pub end_date: Option<String>,
    /// Skip merge commits (commits with > 1 parent)
    pub skip_merges: bool,
    /// Walk every reference instead of just HEAD
    pub all_refs: bool,
}

/// Resolved UTC window derived from the date filters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    /// First instant included
    pub start: Option<DateTime<Utc>>,
    /// First instant excluded (midnight after the end day)
    pub end: Option<DateTime<Utc>>,
}

impl DateWindow {
    /// Build the window from the raw option strings. Unparseable dates
    /// leave that side of the window open.
    pub fn from_options(options: &WalkOptions) -> Self {
        let start = parse_day(options.start_date.as_deref(), "start-date")
            .map(|day| day.and_time(NaiveTime::MIN).and_utc());
        let end = parse_day(options.end_date.as_deref(), "end-date")
            .and_then(|day| day.succ_opt())
            .map(|next| next.and_time(NaiveTime::MIN).and_utc());
        Self { start, end }
    }

    pub fn contains(&self, when: DateTime<Utc>) -> bool {
        if let Some(start) = self.start {
            if when < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if when >= end {
                return false;
            }
        }
        true
    }
}

fn parse_day(value: Option<&str>, label: &str) -> Option<NaiveDate> {
    let raw = value.map(str::trim).filter(|s| !s.is_empty())?;
    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(day) => Some(day),
        Err(e) => {
            debug!("Ignoring malformed {} '{}': {}", label, raw, e);
            None
        }
    }
}

/// Walk repository commits in chronological order and extract records
/// matching the filters in `options`.
pub fn walk_commits(repo_path: &Path, options: &WalkOptions) -> Result<Vec<CommitRecord>> {
    let repo = Repository::open(repo_path).map_err(|e| {
        Error::Git(GitError::RepositoryNotFound {
            path: repo_path.display().to_string(),
            source: e.message().to_string(),
        })
    })?;

    let revwalk = setup_revwalk(&repo, options)?;
    let window = DateWindow::from_options(options);
    let author = options
        .author
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty());

    let mut commits = Vec::new();
    let mut scanned = 0usize;

    for oid_result in revwalk {
        let oid = oid_result.map_err(git_failure("revwalk"))?;
        scanned += 1;

        let commit = repo
            .find_commit(oid)
            .map_err(|_| Error::Git(GitError::CommitNotFound(oid.to_string())))?;

        if options.skip_merges && commit.parent_count() > 1 {
            continue;
        }

        let signature = commit.author();
        let email = signature.email().unwrap_or("");
        if let Some(wanted) = author {
            if !email.eq_ignore_ascii_case(wanted) {
                continue;
            }
        }

        let timestamp = DateTime::<Utc>::from_timestamp(signature.when().seconds(), 0)
            .ok_or_else(|| {
                Error::Git(GitError::GitCommandFailed {
                    operation: "read timestamp".to_string(),
                    source: format!("commit {} has an out-of-range author time", oid),
                })
            })?;
        if !window.contains(timestamp) {
            continue;
        }

        let (lines_added, lines_deleted, diff) = render_diff(&repo, &commit)?;

        commits.push(CommitRecord {
            hash: oid.to_string(),
            author: format!(
                "{} <{}>",
                signature.name().unwrap_or("Unknown"),
                email
            ),
            author_email: email.to_string(),
            timestamp,
            message: commit.message().unwrap_or("").to_string(),
            lines_added,
            lines_deleted,
            diff,
        });
    }

    debug!(
        "Walked {} commits, kept {} after filtering",
        scanned,
        commits.len()
    );

    Ok(commits)
}

/// Set up revision walker with proper sorting and starting point
fn setup_revwalk<'a>(repo: &'a Repository, options: &WalkOptions) -> Result<Revwalk<'a>> {
    let mut revwalk = repo.revwalk().map_err(git_failure("create revwalk"))?;

    // Oldest first
    revwalk
        .set_sorting(Sort::TOPOLOGICAL | Sort::TIME | Sort::REVERSE)
        .map_err(git_failure("set revwalk sorting"))?;

    if options.all_refs {
        // Non-commit refs matching the glob are skipped by libgit2
        revwalk
            .push_glob("*")
            .map_err(git_failure("push all refs"))?;
        return Ok(revwalk);
    }

    match repo.head() {
        Ok(_head) => {
            revwalk.push_head().map_err(git_failure("push HEAD"))?;
        }
        Err(_) => {
            // Detached HEAD or empty repo - try main/master
            if repo.find_reference("refs/heads/main").is_ok() {
                revwalk
                    .push_ref("refs/heads/main")
                    .map_err(git_failure("push main"))?;
            } else if repo.find_reference("refs/heads/master").is_ok() {
                revwalk
                    .push_ref("refs/heads/master")
                    .map_err(git_failure("push master"))?;
            }
            // Otherwise empty repository - nothing pushed, nothing walked
        }
    }

    Ok(revwalk)
}

/// Diff a commit against its first parent (or the empty tree for a root
/// commit), returning `(insertions, deletions, patch_text)`.
fn render_diff(repo: &Repository, commit: &git2::Commit) -> Result<(u64, u64, String)> {
    let current_tree = commit.tree().map_err(git_failure("read commit tree"))?;

    let parent_tree = if commit.parent_count() > 0 {
        Some(
            commit
                .parent(0)
                .and_then(|p| p.tree())
                .map_err(git_failure("read parent tree"))?,
        )
    } else {
        None
    };

    let mut diff_opts = DiffOptions::new();
    let diff = repo
        .diff_tree_to_tree(parent_tree.as_ref(), Some(&current_tree), Some(&mut diff_opts))
        .map_err(git_failure("diff trees"))?;

    let stats = diff.stats().map_err(git_failure("diff stats"))?;

    let mut patch = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        if matches!(line.origin(), '+' | '-' | ' ') {
            patch.push(line.origin());
        }
        patch.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .map_err(git_failure("render patch"))?;

    Ok((stats.insertions() as u64, stats.deletions() as u64, patch))
}

fn git_failure(operation: &'static str) -> impl Fn(git2::Error) -> Error {
    move |e| {
        Error::Git(GitError::GitCommandFailed {
            operation: operation.to_string(),
            source: e.message().to_string(),
        })
    }
}
