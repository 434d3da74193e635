use std::collections::HashSet;

use console::style;

use crate::auth::{get_access_token, EmbedTokenIssuer, ReportEmbedInfo, TokenClient};
use crate::cli::{http_client, load_settings, Cli};
use crate::config::Settings;
use crate::errors::FabricError;
use crate::metadata::{load_reports, validate_reports};
use crate::models::ReportMetadata;
use crate::utils::output;

type Check = Result<String, String>;

pub async fn handle_preflight(cli: &Cli) -> Result<(), FabricError> {
    let settings = load_settings(cli, cli.overrides()).await?;
    let client = http_client()?;
    println!("{}", style("Pre-flight checks").bold());

    let mut results: Vec<(&str, Check)> = Vec::new();

    let missing = settings.missing_required();
    results.push((
        "credentials",
        if missing.is_empty() {
            Ok("all variables set".into())
        } else {
            Err(format!("missing {}", missing.join(", ")))
        },
    ));
    results.push(("environment", Ok(settings.environment.to_string())));

    let reports = load_reports(&settings.metadata_dir).await;
    results.push(("reports loaded", check_loaded(&settings, &reports)));
    let reports = reports.unwrap_or_default();
    results.extend(check_metadata(&reports));

    let token = if missing.is_empty() {
        match settings.service_principal() {
            Ok(principal) => get_access_token(&client, &settings.endpoints, &principal, &settings.retry)
                .await
                .map_err(|e| settings.redact(&e.to_string())),
            Err(e) => Err(e.to_string()),
        }
    } else {
        Err("skipped: credentials missing".to_string())
    };
    results.push(("access token", token.as_ref().map(|_| "acquired".to_string()).map_err(Clone::clone)));

    let embed = match (&token, reports.first()) {
        (Ok(access), Some(first)) => check_embed_token(&settings, client.clone(), access, first).await,
        (Err(_), _) => Err("skipped: no access token".to_string()),
        (_, None) => Err("skipped: no reports".to_string()),
    };
    results.push(("embed token", embed));

    for (name, result) in &results {
        output::check(name, result);
    }
    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    if failed > 0 {
        return Err(FabricError::PreflightFailed(failed));
    }
    println!("{}", style("All pre-flight checks passed").green().bold());
    Ok(())
}

fn check_loaded(settings: &Settings, reports: &Result<Vec<ReportMetadata>, FabricError>) -> Check {
    match reports {
        Ok(r) if r.is_empty() => Err(format!("no reports found in {}", settings.metadata_dir.display())),
        Ok(r) => Ok(format!("{} report(s)", r.len())),
        Err(e) => Err(e.to_string()),
    }
}

fn check_metadata(reports: &[ReportMetadata]) -> Vec<(&'static str, Check)> {
    let issues = validate_reports(reports);
    let (dupes, missing): (Vec<_>, Vec<_>) = issues.iter().partition(|i| i.problem.starts_with("duplicate"));

    let describe = |found: Vec<&crate::metadata::ReportIssue>| -> Check {
        if found.is_empty() {
            Ok(String::new())
        } else {
            Err(found
                .iter()
                .map(|i| format!("{}: {}", i.report, i.problem))
                .collect::<Vec<_>>()
                .join("; "))
        }
    };
    let ids: HashSet<&str> = reports.iter().map(|r| r.id.as_str()).collect();
    vec![
        ("required fields", describe(missing)),
        ("unique report ids", describe(dupes).map(|_| format!("{} distinct", ids.len()))),
    ]
}

async fn check_embed_token(
    settings: &Settings,
    client: reqwest::Client,
    access_token: &str,
    report: &ReportMetadata,
) -> Check {
    let info = ReportEmbedInfo::from_metadata(report).map_err(|e| e.to_string())?;
    let issuer = TokenClient::new(client, settings, access_token.to_string());
    issuer
        .embed_token(&info)
        .await
        .map(|_| format!("issued for {}", report.case_id()))
        .map_err(|e| settings.redact(&e.to_string()))
}
