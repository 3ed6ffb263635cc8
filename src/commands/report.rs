//! Report command: walk history, bucket by day, summarize, score, write CSV.
//!
//! Days are summarized independently. A failed or timed-out day keeps an
//! empty narrative and the run carries on; only repository, configuration
//! and output errors abort.

use crate::config::{Config, PipelineConfig};
use crate::error::{Error, IoError, SummarizationError};
use crate::git::{walk_commits, CommitRecord, WalkOptions};
use crate::report::{aggregate_by_day, apply_effort, write_csv, DaySummary};
use crate::summarize::Summarizer;
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Everything the report command needs, resolved at startup
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub repo_path: PathBuf,
    pub walk: WalkOptions,
    pub config: Config,
    /// Write the CSV here instead of stdout
    pub output: Option<PathBuf>,
}

/// Called once per day when its summarization finishes
pub type DayObserver<'a> = &'a (dyn Fn(&DaySummary, Option<&SummarizationError>) + Sync);

/// Run the report command. `options.config` must already be validated.
pub async fn report_command(options: ReportOptions) -> Result<()> {
    let summarizer =
        Summarizer::from_config(&options.config.summarizer).context("Failed to create summarizer")?;

    info!(
        "Starting report for {} [summarizer: {}, author: {}, start: {}, end: {}]",
        options.repo_path.display(),
        summarizer.kind(),
        options.walk.author.as_deref().unwrap_or("any"),
        options.walk.start_date.as_deref().unwrap_or("-"),
        options.walk.end_date.as_deref().unwrap_or("-"),
    );

    let pb = spinner("Walking git history...");
    let commits = walk_commits(&options.repo_path, &options.walk).context("Failed to get commits")?;
    pb.finish_and_clear();
    info!("Found {} commits", commits.len());

    let progress = if summarizer.is_enabled() {
        day_progress(commits.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    let observer = |day: &DaySummary, _err: Option<&SummarizationError>| {
        progress.inc(day.commit_count as u64);
        progress.set_message(day.day.to_string());
    };

    let days = build_report(commits, &summarizer, &options.config.pipeline, &observer).await;
    progress.finish_and_clear();
    info!("Generated {} daily summaries", days.len());

    match &options.output {
        Some(path) => {
            let file = File::create(path).map_err(|source| {
                Error::Io(IoError::FileWriteFailed {
                    path: path.display().to_string(),
                    source,
                })
            })?;
            write_csv(&days, BufWriter::new(file))?;
            info!("Wrote report to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            write_csv(&days, stdout.lock())?;
        }
    }

    Ok(())
}

/// Aggregate, summarize and score. Never fails: summarization errors are
/// logged and leave that day's narrative empty.
pub async fn build_report(
    commits: Vec<CommitRecord>,
    summarizer: &Summarizer,
    pipeline: &PipelineConfig,
    observer: DayObserver<'_>,
) -> Vec<DaySummary> {
    let mut days = aggregate_by_day(commits);
    summarize_days(&mut days, summarizer, pipeline, observer).await;
    apply_effort(&mut days);
    days
}

/// Fill in `narrative` for every day, with at most `pipeline.jobs` days in
/// flight. Results are applied in day order.
pub async fn summarize_days(
    days: &mut [DaySummary],
    summarizer: &Summarizer,
    pipeline: &PipelineConfig,
    observer: DayObserver<'_>,
) {
    let deadline = Duration::from_secs(pipeline.day_timeout_secs);

    let outcomes: Vec<Result<String, SummarizationError>> = stream::iter(days.iter())
        .map(|day| async move {
            let outcome = summarizer.summarize_within(&day.commits, deadline).await;
            observer(day, outcome.as_ref().err());
            outcome
        })
        .buffered(pipeline.jobs.max(1))
        .collect()
        .await;

    for (day, outcome) in days.iter_mut().zip(outcomes) {
        match outcome {
            Ok(narrative) => day.narrative = narrative,
            Err(e) => warn!(
                "Skipping narrative for {} ({} commits): {}",
                day.day,
                day.commit_count,
                Error::from(e)
            ),
        }
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn day_progress(total_commits: u64) -> ProgressBar {
    let pb = ProgressBar::new(total_commits);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} Summarizing {msg} [{bar:30}] {pos}/{len} commits")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
