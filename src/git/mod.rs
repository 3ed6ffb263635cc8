//! Commit extraction from local repositories

pub mod walker;

pub use walker::{walk_commits, CommitRecord, DateWindow, WalkOptions};
