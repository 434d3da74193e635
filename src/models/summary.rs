use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::result::ReportResult;

/// Pass/fail statistics derived from a set of report results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedSummary {
    pub total_reports: usize,
    pub total_pages: usize,
    pub failed_pages: usize,
    pub passed_pages: usize,
    /// Percentage of passed pages, two decimals; 0 when there are no pages.
    pub pass_rate: f64,
}

impl AggregatedSummary {
    pub fn from_reports(reports: &[ReportResult]) -> Self {
        let total_pages: usize = reports.iter().map(ReportResult::page_count).sum();
        let failed_pages: usize = reports.iter().map(ReportResult::failed_page_count).sum();
        let passed_pages = total_pages - failed_pages;
        let pass_rate = if total_pages == 0 {
            0.0
        } else {
            round2(passed_pages as f64 / total_pages as f64 * 100.0)
        };

        Self {
            total_reports: reports.len(),
            total_pages,
            failed_pages,
            passed_pages,
            pass_rate,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed_pages == 0
    }
}

/// Canonical artifact of one test session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalReport {
    pub environment: String,
    /// UTC, second precision, `YYYY-MM-DDTHH:MM:SSZ`.
    pub generated_at: String,
    pub summary: AggregatedSummary,
    pub reports: Vec<ReportResult>,
}

impl FinalReport {
    pub fn new(environment: &str, generated_at: DateTime<Utc>, reports: Vec<ReportResult>) -> Self {
        Self {
            environment: environment.to_string(),
            generated_at: generated_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            summary: AggregatedSummary::from_reports(&reports),
            reports,
        }
    }
}

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
