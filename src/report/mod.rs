//! Day buckets, effort scoring and CSV rendering.
//!
//! Everything in this module except the writer is pure: no logging, no I/O.

pub mod effort;
pub mod writer;

use crate::git::CommitRecord;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

pub use effort::{apply_effort, estimate};
pub use writer::{write_csv, HEADER};

/// All commits that share one UTC calendar day, with running totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub day: NaiveDate,
    /// Commits in the order they were encountered
    pub commits: Vec<CommitRecord>,
    pub commit_count: usize,
    pub lines_added: u64,
    pub lines_deleted: u64,
    /// Empty until summarization runs (and stays empty if it fails)
    pub narrative: String,
    /// Zero until [`apply_effort`] runs
    pub effort: f64,
}

impl DaySummary {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day,
            commits: Vec::new(),
            commit_count: 0,
            lines_added: 0,
            lines_deleted: 0,
            narrative: String::new(),
            effort: 0.0,
        }
    }

    /// Add one commit and update the totals.
    pub fn push(&mut self, commit: CommitRecord) {
        self.commit_count += 1;
        self.lines_added += commit.lines_added;
        self.lines_deleted += commit.lines_deleted;
        self.commits.push(commit);
    }

    /// Space-joined commit hashes, as shown in the report.
    pub fn hashes(&self) -> String {
        self.commits
            .iter()
            .map(|c| c.hash.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// UTC calendar day a commit belongs to.
pub fn day_of(commit: &CommitRecord) -> NaiveDate {
    commit.timestamp.date_naive()
}

/// Group commits into one [`DaySummary`] per distinct UTC day, sorted by
/// day ascending. Commits keep their input order inside each bucket.
pub fn aggregate_by_day<I>(commits: I) -> Vec<DaySummary>
where
    I: IntoIterator<Item = CommitRecord>,
{
    let mut buckets: BTreeMap<NaiveDate, DaySummary> = BTreeMap::new();

    for commit in commits {
        let day = day_of(&commit);
        buckets
            .entry(day)
            .or_insert_with(|| DaySummary::new(day))
            .push(commit);
    }

    buckets.into_values().collect()
}
