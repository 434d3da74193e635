#![allow(dead_code)]

use fabric_ci_test::models::{OrderedMap, PageResult, ReportResult};

/// Page with the given error entries; no errors means a passing page.
pub fn page(errors: &[(&str, &str)], service_url: &str) -> PageResult {
    PageResult {
        errors: errors.iter().map(|(k, v)| (*k, v.to_string())).collect(),
        visuals: OrderedMap::new(),
        duration: 1200.0,
        embed_url: String::new(),
        service_url: service_url.to_string(),
    }
}

pub fn report<K: Into<String>>(id: &str, name: &str, pages: Vec<(K, PageResult)>) -> ReportResult {
    let pages: Vec<(String, PageResult)> = pages.into_iter().map(|(k, p)| (k.into(), p)).collect();
    let failed_pages = pages
        .iter()
        .filter(|(_, p)| !p.passed())
        .map(|(n, _)| n.clone())
        .collect();
    ReportResult {
        report_id: id.to_string(),
        report_name: name.to_string(),
        environment: "prod".to_string(),
        pages: pages.into_iter().collect(),
        failed_pages,
        report_load_time: 900.0,
        total_duration: 5000.0,
        test_duration: 6000.0,
    }
}

/// Report whose pages are named `page1..` and pass or fail per `outcomes`.
pub fn report_with(id: &str, outcomes: &[bool]) -> ReportResult {
    let pages = outcomes
        .iter()
        .enumerate()
        .map(|(i, ok)| {
            let errors: &[(&str, &str)] = if *ok { &[] } else { &[("visual-1", "Visual did not render within timeout")] };
            (format!("page{}", i + 1), page(errors, "https://example.com"))
        })
        .collect();
    report(id, &format!("Report {}", id), pages)
}

pub fn write_worker_file(dir: &std::path::Path, worker: &str, reports: &[ReportResult]) {
    std::fs::write(
        dir.join(format!("results_{}.json", worker)),
        serde_json::to_string_pretty(reports).unwrap(),
    )
    .unwrap();
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Settings with complete credentials, pointed at `base` and writing into `results_dir`.
pub fn test_settings(base: &str, results_dir: &std::path::Path, ci: bool) -> fabric_ci_test::config::Settings {
    use fabric_ci_test::config::{ApiEndpoints, Settings, SettingsOverrides};

    let mut env: std::collections::HashMap<String, String> = [
        ("SP_CLIENT_ID", "client-1"),
        ("SP_CLIENT_SECRET", "s3cret"),
        ("SP_TENANT_ID", "tenant-1"),
        ("WORKSPACE_ID", "ws-1"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    if ci {
        env.insert("CI".into(), "true".into());
    }

    let overrides = SettingsOverrides {
        results_dir: Some(results_dir.to_path_buf()),
        ..Default::default()
    };
    let mut settings = Settings::resolve(None, &env, overrides).unwrap();
    settings.endpoints = ApiEndpoints::with_base(base);
    settings.metadata_dir = results_dir.join("metadata");
    settings.retry.max_retries = 0;
    settings
}
