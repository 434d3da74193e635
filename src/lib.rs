//! Visual regression testing for Power BI reports.
//!
//! A coordinating session refreshes workspace metadata, fans reports out to worker
//! processes that embed each report in a headless browser and wait for every visual
//! to render, then merges the per-worker result files into one JSON artifact and a
//! self-contained HTML report.

pub mod auth;
pub mod cli;
pub mod config;
pub mod errors;
pub mod metadata;
pub mod models;
pub mod probe;
pub mod reporting;
pub mod results;
pub mod session;
pub mod utils;

/// `1.0.0 (abc1234, built 2026-01-01T00:00:00Z)`
pub fn version_line() -> String {
    format!(
        "{} ({}, built {})",
        env!("CARGO_PKG_VERSION"),
        option_env!("GIT_HASH").unwrap_or("dev"),
        option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
    )
}
