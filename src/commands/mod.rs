pub mod report;

pub use report::{build_report, report_command, summarize_days, ReportOptions};
