use std::path::Path;

use tokio::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};

use super::state::WorkerId;
use crate::auth::{EmbedTokenIssuer, ReportEmbedInfo};
use crate::config::Settings;
use crate::errors::FabricError;
use crate::models::{ReportMetadata, ReportResult};
use crate::probe::{scan_report, EmbedSurface, EmbedTarget, ReportScan, SurfaceFactory, WaitPolicy};
use crate::reporting::screenshot_file_name;
use crate::results::ResultWriter;
use crate::utils::output;

/// Verdict for one report test case.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseOutcome {
    Passed,
    Failed { failed_pages: usize },
    /// Token, metadata or browser failure; no result was recorded.
    Errored(String),
}

impl CaseOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CaseOutcome::Passed)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
}

impl WorkerSummary {
    pub fn unsuccessful(&self) -> usize {
        self.failed + self.errored
    }
}

/// Collaborators one worker needs to run its cases.
pub struct WorkerContext<'a> {
    pub settings: &'a Settings,
    pub worker_id: WorkerId,
    pub tokens: &'a dyn EmbedTokenIssuer,
    pub surfaces: &'a dyn SurfaceFactory,
    pub writer: ResultWriter,
}

impl<'a> WorkerContext<'a> {
    pub fn new(
        settings: &'a Settings,
        worker_id: WorkerId,
        tokens: &'a dyn EmbedTokenIssuer,
        surfaces: &'a dyn SurfaceFactory,
    ) -> Self {
        let writer = ResultWriter::new(&settings.results_dir, worker_id.as_str());
        Self { settings, worker_id, tokens, surfaces, writer }
    }
}

fn millis_since(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Run this worker's reports one after another.
pub async fn run_worker(ctx: &mut WorkerContext<'_>, reports: &[ReportMetadata]) -> WorkerSummary {
    let span = info_span!("worker", worker_id = %ctx.worker_id);
    async {
        info!(reports = reports.len(), "Worker starting");
        let mut summary = WorkerSummary::default();
        for report in reports {
            match run_report_case(ctx, report).await {
                CaseOutcome::Passed => summary.passed += 1,
                CaseOutcome::Failed { .. } => summary.failed += 1,
                CaseOutcome::Errored(_) => summary.errored += 1,
            }
        }
        info!(passed = summary.passed, failed = summary.failed, errored = summary.errored, "Worker finished");
        summary
    }
    .instrument(span)
    .await
}

/// Test one report: embed token, page scan, screenshots of failing pages, result append.
pub async fn run_report_case(ctx: &mut WorkerContext<'_>, report: &ReportMetadata) -> CaseOutcome {
    let case_id = report.case_id();
    output::case_header(&case_id, ctx.worker_id.as_str());
    let started = Instant::now();

    let scan = match probe_report(ctx, report).await {
        Ok(scan) => scan,
        Err(e) => {
            let message = ctx.settings.redact(&e.to_string());
            error!(case = %case_id, error = %message, "Report test errored");
            output::case_errored(&case_id, &message);
            return CaseOutcome::Errored(message);
        }
    };

    let result = ReportResult {
        report_id: report.id.clone(),
        report_name: report.name.clone(),
        environment: ctx.settings.environment.to_string(),
        pages: scan.pages,
        failed_pages: scan.failed_pages,
        report_load_time: scan.report_load_time,
        total_duration: scan.total_duration,
        test_duration: millis_since(started),
    };

    if let Err(e) = ctx.writer.append(&result).await {
        error!(case = %case_id, error = %e, "Failed to record report result");
        output::case_errored(&case_id, &e.to_string());
        return CaseOutcome::Errored(e.to_string());
    }

    for (name, page) in result.pages.iter() {
        if page.passed() {
            output::page_passed(name);
        } else {
            output::page_failed(name, page);
        }
    }

    let failed_pages = result.failed_page_count();
    info!(
        case = %case_id,
        pages = result.page_count(),
        failed_pages,
        duration_ms = result.test_duration,
        "Report test finished"
    );
    if failed_pages == 0 {
        CaseOutcome::Passed
    } else {
        CaseOutcome::Failed { failed_pages }
    }
}

async fn probe_report(ctx: &WorkerContext<'_>, report: &ReportMetadata) -> Result<ReportScan, FabricError> {
    let info = ReportEmbedInfo::from_metadata(report)?;
    let embed_url = report
        .embed_url
        .clone()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| FabricError::InvalidReport(format!("Report {} is missing EmbedUrl", report.name)))?;
    let embed_token = ctx.tokens.embed_token(&info).await?;

    let target = EmbedTarget {
        report_id: info.report_id.clone(),
        workspace_id: info.workspace_id.clone(),
        embed_url,
        embed_token,
    };

    let mut surface = ctx.surfaces.open().await?;
    let policy = WaitPolicy::from(&ctx.settings.probe);
    let scanned = scan_report(surface.as_mut(), &target, &ctx.settings.endpoints, &policy).await;

    if let Ok(scan) = &scanned {
        for page in &scan.failed_pages {
            capture_page(surface.as_mut(), page, ctx).await;
        }
    }
    if let Err(e) = surface.close().await {
        warn!(report_id = %target.report_id, error = %e, "Failed to close embed surface");
    }
    scanned
}

/// Best effort: re-activate the page, let it settle, save `<page>_<worker>.png`.
async fn capture_page(surface: &mut dyn EmbedSurface, page: &str, ctx: &WorkerContext<'_>) {
    let path = ctx
        .settings
        .results_dir
        .join(screenshot_file_name(page, ctx.worker_id.as_str()));
    let captured = async {
        surface.activate(page).await?;
        tokio::time::sleep(ctx.settings.probe.screenshot_settle).await;
        let bytes = surface.capture().await?;
        write_bytes(&path, &bytes).await
    }
    .await;

    match captured {
        Ok(()) => info!(page, path = %path.display(), "Screenshot saved"),
        Err(e) => warn!(page, error = %e, "Screenshot failed"),
    }
}

async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), FabricError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}
