use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::surface::{EmbedSurface, EmbedTarget};
use super::wait::{await_page_render, synthesize_page_errors, WaitPolicy};
use crate::config::ApiEndpoints;
use crate::errors::FabricError;
use crate::models::{OrderedMap, PageResult, VisualStatus};

/// Raw probe output for one report, before it is stamped with report identity.
#[derive(Debug, Clone, Default)]
pub struct ReportScan {
    pub pages: OrderedMap<PageResult>,
    pub failed_pages: Vec<String>,
    pub report_load_time: f64,
    pub total_duration: f64,
}

fn millis_since(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Embed the report and probe every page in discovery order.
///
/// Rendering problems become page errors; only surface failures abort the scan.
pub async fn scan_report(
    surface: &mut dyn EmbedSurface,
    target: &EmbedTarget,
    endpoints: &ApiEndpoints,
    policy: &WaitPolicy,
) -> Result<ReportScan, FabricError> {
    let started = Instant::now();
    let report_load_time = surface.load_report(target).await?;
    debug!(report_id = %target.report_id, load_ms = report_load_time, "Report loaded");

    let page_names = surface.pages().await?;
    let mut scan = ReportScan { report_load_time, ..Default::default() };

    for name in page_names {
        let page_started = Instant::now();
        let visuals = surface.visuals(&name).await?;
        let mut events = surface.listen().await?;
        surface.activate(&name).await?;

        let outcome = await_page_render(&visuals, &mut events, policy).await;
        if let Err(e) = surface.unlisten().await {
            warn!(page = %name, error = %e, "Failed to detach page listeners");
        }

        let errors = synthesize_page_errors(&visuals, &outcome);
        let mut statuses = OrderedMap::new();
        for v in &visuals {
            statuses.insert(
                v.id.clone(),
                VisualStatus {
                    title: v.label().to_string(),
                    kind: v.kind.clone(),
                    rendered: outcome.rendered.contains(&v.id),
                },
            );
        }

        let page = PageResult {
            errors,
            visuals: statuses,
            duration: millis_since(page_started),
            embed_url: endpoints.embed_page_url(&target.report_id, &name),
            service_url: endpoints.service_page_url(&target.workspace_id, &target.report_id, &name),
        };
        if page.passed() {
            debug!(page = %name, visuals = visuals.len(), "Page rendered");
        } else {
            info!(page = %name, errors = page.errors.len(), timed_out = outcome.timed_out, "Page has visual errors");
            scan.failed_pages.push(name.clone());
        }
        scan.pages.insert(name, page);
    }

    scan.total_duration = millis_since(started);
    Ok(scan)
}
