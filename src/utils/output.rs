use console::style;

use crate::models::{AggregatedSummary, PageResult};
use crate::utils::formatting::{format_duration, format_percent};

pub fn page_passed(name: &str) {
    println!("  {} {}", style("✓").green(), name);
}

pub fn page_failed(name: &str, page: &PageResult) {
    println!("  {} {} -> {}", style("✗").red(), name, style(&page.service_url).dim());
}

pub fn case_header(case_id: &str, worker_id: &str) {
    println!("{} {} {}", style("▶").cyan(), style(case_id).bold(), style(format!("[{}]", worker_id)).dim());
}

pub fn case_errored(case_id: &str, message: &str) {
    println!("  {} {}: {}", style("✗").red().bold(), case_id, message);
}

pub fn check(name: &str, result: &Result<String, String>) {
    match result {
        Ok(detail) => println!("  {} {} {}", style("✓").green(), name, style(detail).dim()),
        Err(reason) => println!("  {} {} {}", style("✗").red(), name, style(reason).red()),
    }
}

pub fn session_summary(summary: &AggregatedSummary, elapsed_ms: f64) {
    let rate = format_percent(summary.pass_rate);
    let rate = if summary.all_passed() { style(rate).green().bold() } else { style(rate).red().bold() };
    println!();
    println!(
        "{} reports, {} pages: {} passed, {} failed ({}) in {}",
        summary.total_reports,
        summary.total_pages,
        style(summary.passed_pages).green(),
        style(summary.failed_pages).red(),
        rate,
        format_duration(elapsed_ms),
    );
}
