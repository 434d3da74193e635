use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, warn};

use super::writer::RESULT_FILE_PATTERN;
use crate::errors::FabricError;
use crate::models::{FinalReport, ReportResult};
use crate::utils::fs::{atomic_write, glob_in};

pub const FINAL_RESULTS_FILE: &str = "all_reports_results.json";

/// Worker output gathered from a results directory.
#[derive(Debug, Default)]
pub struct WorkerResults {
    /// Concatenated in file enumeration order.
    pub reports: Vec<ReportResult>,
    /// Files that parsed and contributed to `reports`.
    pub consumed: Vec<PathBuf>,
    /// Files skipped because they could not be read or parsed.
    pub skipped: Vec<PathBuf>,
}

/// Parse every worker result file in `results_dir`, skipping unreadable ones.
pub async fn collect_worker_results(results_dir: &Path) -> Result<WorkerResults, FabricError> {
    if !tokio::fs::try_exists(results_dir).await? {
        return Err(FabricError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Results directory does not exist: {}", results_dir.display()),
        )));
    }

    let mut collected = WorkerResults::default();

    for entry in glob::glob(&glob_in(results_dir, RESULT_FILE_PATTERN))? {
        let path = match entry {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable results entry");
                continue;
            }
        };
        let parsed = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str::<Vec<ReportResult>>(&content).map_err(FabricError::from),
            Err(e) => Err(FabricError::from(e)),
        };
        match parsed {
            Ok(reports) => {
                collected.reports.extend(reports);
                collected.consumed.push(path);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read worker results, skipping");
                collected.skipped.push(path);
            }
        }
    }
    Ok(collected)
}

/// Merge all worker files into the canonical artifact at `output`, then delete
/// the worker files that were merged.
pub async fn aggregate(results_dir: &Path, environment: &str, output: &Path) -> Result<FinalReport, FabricError> {
    let collected = collect_worker_results(results_dir).await?;
    let report = FinalReport::new(environment, Utc::now(), collected.reports);

    let content = serde_json::to_string_pretty(&report)?;
    atomic_write(output, &content).await?;

    for path in &collected.consumed {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "Failed to delete worker results");
        }
    }

    info!(
        files = collected.consumed.len(),
        skipped = collected.skipped.len(),
        reports = report.summary.total_reports,
        pages = report.summary.total_pages,
        failed_pages = report.summary.failed_pages,
        pass_rate = report.summary.pass_rate,
        output = %output.display(),
        "Aggregated worker results"
    );
    Ok(report)
}
