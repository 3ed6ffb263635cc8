//! Effort heuristic: commits weigh more than raw churn.

use super::DaySummary;

/// Lines of churn that count as one extra commit
const LINES_PER_UNIT: u64 = 100;

/// Units per effort point
const UNITS_PER_POINT: f64 = 10.0;

/// `(commit_count + floor((added + deleted) / 100)) / 10`
pub fn estimate(summary: &DaySummary) -> f64 {
    let churn_units = (summary.lines_added + summary.lines_deleted) / LINES_PER_UNIT;
    (summary.commit_count as u64 + churn_units) as f64 / UNITS_PER_POINT
}

/// Fill in `effort` for every day.
pub fn apply_effort(summaries: &mut [DaySummary]) {
    for summary in summaries.iter_mut() {
        summary.effort = estimate(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(commit_count: usize, added: u64, deleted: u64) -> DaySummary {
        let mut summary = DaySummary::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        summary.commit_count = commit_count;
        summary.lines_added = added;
        summary.lines_deleted = deleted;
        summary
    }

    #[test]
    fn test_zero_day() {
        assert_eq!(estimate(&day(0, 0, 0)), 0.0);
    }

    #[test]
    fn test_churn_is_floored() {
        assert_eq!(estimate(&day(3, 150, 50)), 0.5);
        assert_eq!(estimate(&day(1, 99, 0)), 0.1);
        assert_eq!(estimate(&day(1, 60, 40)), 0.2);
    }

    #[test]
    fn test_apply_effort_fills_every_day() {
        let mut days = vec![day(10, 0, 0), day(2, 1000, 0)];
        apply_effort(&mut days);
        assert_eq!(days[0].effort, 1.0);
        assert_eq!(days[1].effort, 1.2);
    }
}
