//! CSV rendering of the daily report

use super::DaySummary;
use crate::error::Result;
use std::io::Write;

/// Fixed header row, always written first
pub const HEADER: [&str; 7] = [
    "date",
    "effort in terms of days of work",
    "no of commits",
    "commit SHAs",
    "lines added",
    "lines deleted",
    "summary",
];

/// Write one row per day, preceded by [`HEADER`] (also for zero days).
pub fn write_csv<W: Write>(summaries: &[DaySummary], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(HEADER)?;

    for summary in summaries {
        writer.write_record([
            summary.day.format("%Y-%m-%d").to_string(),
            format!("{:.2}", summary.effort),
            summary.commit_count.to_string(),
            summary.hashes(),
            summary.lines_added.to_string(),
            summary.lines_deleted.to_string(),
            summary.narrative.clone(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
