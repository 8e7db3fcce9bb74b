//! Report assembly: one CSV row per checked URL plus per-status counts.

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use tracing::info;

use crate::checker::CheckResult;
use crate::error::TriageResult;
use crate::status::Status;

const REPORT_HEADERS: [&str; 4] = ["Domain", "Status", "Timestamp", "Notes"];

/// Per-status counts for the end-of-run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSummary {
    pub server_error: usize,
    pub not_found: usize,
    pub parked: usize,
    pub broken: usize,
    pub ok: usize,
    pub other: usize,
}

impl StatusSummary {
    #[must_use]
    pub fn tally(results: &[CheckResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            match result.status {
                Status::ServerError5xx => summary.server_error += 1,
                Status::NotFound => summary.not_found += 1,
                Status::Parked => summary.parked += 1,
                Status::Broken => summary.broken += 1,
                Status::Ok => summary.ok += 1,
                Status::Other => summary.other += 1,
            }
        }
        summary
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.server_error + self.not_found + self.parked + self.broken + self.ok + self.other
    }
}

/// Write the report CSV and log the summary. All rows carry the same
/// ISO-8601 instant, the moment of report generation.
pub fn write_report(path: &Path, results: &[CheckResult]) -> TriageResult<StatusSummary> {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(REPORT_HEADERS)?;
    for result in results {
        writer.write_record([
            result.url.as_str(),
            result.status.as_str(),
            timestamp.as_str(),
            result.note.as_str(),
        ])?;
    }
    writer.flush()?;

    let summary = StatusSummary::tally(results);
    info!(
        total = summary.total(),
        ok = summary.ok,
        parked = summary.parked,
        broken = summary.broken,
        not_found = summary.not_found,
        server_error = summary.server_error,
        other = summary.other,
        "report written to {}",
        path.display()
    );

    Ok(summary)
}
