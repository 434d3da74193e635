use std::fmt::Write as _;
use std::path::Path;

use base64::Engine as _;
use tracing::{debug, warn};

use super::screenshots::find_screenshot;
use crate::errors::FabricError;
use crate::models::{FinalReport, PageResult, ReportResult};
use crate::utils::formatting::{format_percent, pluralize};
use crate::utils::fs::atomic_write;

pub const REPORT_FILE: &str = "report.html";

const STYLE: &str = r#"
    body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; padding: 20px; background: #f5f5f5; color: #333; }
    h1 { margin-bottom: 4px; }
    .header { background: #fff; padding: 20px 24px; border-radius: 8px; margin-bottom: 20px; box-shadow: 0 1px 3px rgba(0,0,0,0.1); }
    .header .meta { color: #666; font-size: 14px; }
    .summary { display: flex; gap: 16px; flex-wrap: wrap; margin-bottom: 20px; }
    .stat { background: #fff; padding: 16px 20px; border-radius: 8px; box-shadow: 0 1px 3px rgba(0,0,0,0.1); min-width: 140px; }
    .stat .label { font-size: 13px; color: #666; text-transform: uppercase; }
    .stat .value { font-size: 28px; font-weight: 700; margin-top: 4px; }
    .stat .value.pass { color: #22863a; }
    .stat .value.fail { color: #cb2431; }
    .card { background: #fff; padding: 20px 24px; border-radius: 8px; margin-bottom: 16px; box-shadow: 0 1px 3px rgba(0,0,0,0.1); }
    .card.failed { border-left: 4px solid #cb2431; }
    .card h3 { margin: 0 0 12px 0; }
    .card .meta { color: #666; font-size: 13px; }
    .card a { color: #0366d6; }
    .page-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(480px, 1fr)); gap: 16px; margin-top: 12px; }
    .page-tile { background: #fafafa; border: 1px solid #e1e4e8; border-radius: 6px; padding: 14px; }
    .page-tile h4 { margin: 0 0 6px 0; font-size: 15px; }
    .page-tile .meta { margin: 0 0 4px 0; }
    .page-tile img { max-width: 100%; border: 1px solid #ddd; border-radius: 4px; margin-top: 8px; }
    table { width: 100%; border-collapse: collapse; margin-top: 8px; font-size: 14px; }
    th, td { text-align: left; padding: 6px 10px; border-bottom: 1px solid #eee; }
    th { background: #f9f9f9; font-weight: 600; }
    .all-pass { text-align: center; padding: 40px; color: #22863a; }
    .all-pass h2 { font-size: 24px; }
"#;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the session document. Depends only on `report` and the screenshot files in
/// `screenshot_dir`, so the same inputs always produce the same bytes.
pub fn render(report: &FinalReport, screenshot_dir: &Path) -> String {
    let mut html = String::new();
    let summary = &report.summary;
    let rate_class = if summary.pass_rate >= 100.0 { "pass" } else { "fail" };

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    html.push_str("<title>Power BI Visual Test Report</title>\n<style>");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n");

    let _ = write!(
        html,
        "<div class=\"header\">\n    <h1>Power BI Visual Test Report</h1>\n    <p class=\"meta\">Environment: {} | Generated: {}</p>\n</div>\n",
        escape(&report.environment),
        escape(&report.generated_at),
    );

    html.push_str("<div class=\"summary\">\n");
    stat(&mut html, "Reports", &summary.total_reports.to_string(), "");
    stat(&mut html, "Total Pages", &summary.total_pages.to_string(), "");
    stat(&mut html, "Passed", &summary.passed_pages.to_string(), " pass");
    stat(&mut html, "Failed", &summary.failed_pages.to_string(), " fail");
    stat(&mut html, "Pass Rate", &format_percent(summary.pass_rate), &format!(" {}", rate_class));
    html.push_str("</div>\n");

    let cards: Vec<String> = report
        .reports
        .iter()
        .filter_map(|r| report_card(r, screenshot_dir))
        .collect();

    if cards.is_empty() {
        html.push_str("<div class=\"card all-pass\"><h2>All pages passed visual validation</h2></div>\n");
    } else {
        html.push_str("<h2>Failed Reports</h2>\n");
        for card in &cards {
            html.push_str(card);
        }
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn stat(html: &mut String, label: &str, value: &str, class: &str) {
    let _ = writeln!(
        html,
        "    <div class=\"stat\"><div class=\"label\">{}</div><div class=\"value{}\">{}</div></div>",
        label, class, escape(value)
    );
}

/// One card per report with at least one failing page; `None` when every page passed.
fn report_card(report: &ReportResult, screenshot_dir: &Path) -> Option<String> {
    let tiles: Vec<String> = report
        .failing_pages()
        .map(|(name, page)| page_tile(name, page, screenshot_dir))
        .collect();
    if tiles.is_empty() {
        return None;
    }

    let mut card = String::new();
    let _ = write!(
        card,
        "<div class=\"card failed\">\n    <h3>{}</h3>\n    <p class=\"meta\">Report ID: {} | {}</p>\n    <div class=\"page-grid\">\n",
        escape(&report.report_name),
        escape(&report.report_id),
        pluralize(tiles.len(), "failed page"),
    );
    for tile in &tiles {
        card.push_str(tile);
    }
    card.push_str("    </div>\n</div>\n");
    Some(card)
}

fn page_tile(name: &str, page: &PageResult, screenshot_dir: &Path) -> String {
    let mut tile = String::new();
    let _ = write!(
        tile,
        "        <div class=\"page-tile\">\n            <h4>{}</h4>\n            <p class=\"meta\">Duration: {:.0}ms</p>\n",
        escape(name),
        page.duration,
    );
    if !page.service_url.is_empty() {
        let _ = writeln!(
            tile,
            "            <p><a href=\"{}\" target=\"_blank\">Open in Power BI</a></p>",
            escape(&page.service_url)
        );
    }
    tile.push_str("            <table>\n                <thead><tr><th>Visual</th><th>Error</th></tr></thead>\n                <tbody>");
    for (key, message) in page.errors.iter() {
        let _ = write!(tile, "<tr><td>{}</td><td>{}</td></tr>", escape(key), escape(message));
    }
    tile.push_str("</tbody>\n            </table>\n");
    if let Some(img) = embedded_screenshot(name, screenshot_dir) {
        tile.push_str(&img);
    }
    tile.push_str("        </div>\n");
    tile
}

fn embedded_screenshot(page: &str, screenshot_dir: &Path) -> Option<String> {
    let path = find_screenshot(screenshot_dir, page)?;
    match std::fs::read(&path) {
        Ok(bytes) => {
            debug!(page, path = %path.display(), "Embedding screenshot");
            Some(format!(
                "            <img src=\"data:image/png;base64,{}\" alt=\"{}\" />\n",
                base64::engine::general_purpose::STANDARD.encode(bytes),
                escape(page)
            ))
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read screenshot");
            None
        }
    }
}

/// Render and persist the document next to the canonical artifact.
pub async fn write_report(report: &FinalReport, screenshot_dir: &Path, output: &Path) -> Result<(), FabricError> {
    let html = render(report, screenshot_dir);
    atomic_write(output, &html).await?;
    debug!(path = %output.display(), bytes = html.len(), "Wrote HTML report");
    Ok(())
}
