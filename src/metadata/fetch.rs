use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::ApiEndpoints;
use crate::errors::{with_retry, FabricError, RetryConfig};
use crate::models::{ReportMetadata, WorkspaceMetadata};
use crate::utils::fs::atomic_write;

pub const METADATA_FILE_NAME: &str = "reports_datasets.json";

#[derive(Debug, Deserialize)]
struct ValueList<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReport {
    id: String,
    #[serde(default)]
    name: String,
    web_url: Option<String>,
    embed_url: Option<String>,
    dataset_id: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDataset {
    #[serde(default)]
    name: String,
    #[serde(default)]
    is_effective_identity_required: bool,
    #[serde(default)]
    is_effective_identity_roles_required: bool,
}

/// List the workspace's reports and enrich them with dataset RLS flags.
pub async fn fetch_workspace_metadata(
    client: &Client,
    endpoints: &ApiEndpoints,
    access_token: &str,
    workspace_id: &str,
    retry: &RetryConfig,
) -> Result<WorkspaceMetadata, FabricError> {
    let group_url = endpoints.group_url(workspace_id);
    let reports_url = format!("{}/reports", group_url);

    let mut raw: Vec<RawReport> = with_retry("list reports", retry, || async {
        let list: ValueList<RawReport> = get_json(client, &reports_url, access_token, "List reports").await?;
        Ok(list.value)
    })
    .await?;
    raw.sort_by(|a, b| a.id.cmp(&b.id));
    info!(workspace_id, count = raw.len(), "Fetched workspace reports");

    let dataset_ids: BTreeSet<&str> = raw
        .iter()
        .filter_map(|r| r.dataset_id.as_deref())
        .filter(|id| !id.is_empty())
        .collect();

    let mut datasets: HashMap<String, RawDataset> = HashMap::new();
    for ds_id in dataset_ids {
        let url = format!("{}/datasets/{}", group_url, ds_id);
        match get_json::<RawDataset>(client, &url, access_token, "Get dataset").await {
            Ok(ds) => {
                debug!(
                    dataset_id = ds_id,
                    name = %ds.name,
                    effective_identity = ds.is_effective_identity_required,
                    roles_required = ds.is_effective_identity_roles_required,
                    "Fetched dataset"
                );
                datasets.insert(ds_id.to_string(), ds);
            }
            Err(e) => warn!(dataset_id = ds_id, error = %e, "Could not fetch dataset"),
        }
    }

    let reports: Vec<ReportMetadata> = raw
        .into_iter()
        .map(|r| {
            let ds = r.dataset_id.as_ref().and_then(|id| datasets.get(id)).cloned().unwrap_or_default();
            ReportMetadata {
                id: r.id,
                name: r.name,
                web_url: r.web_url,
                embed_url: r.embed_url,
                dataset_id: r.dataset_id,
                dataset_name: ds.name,
                workspace_id: workspace_id.to_string(),
                is_effective_identity_required: ds.is_effective_identity_required,
                is_effective_identity_roles_required: ds.is_effective_identity_roles_required,
                ..Default::default()
            }
        })
        .collect();

    Ok(WorkspaceMetadata {
        workspace_id: workspace_id.to_string(),
        generated_at_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        report_count: reports.len(),
        reports,
    })
}

async fn get_json<T: serde::de::DeserializeOwned>(
    client: &Client,
    url: &str,
    access_token: &str,
    operation: &str,
) -> Result<T, FabricError> {
    let resp = client
        .get(url)
        .bearer_auth(access_token)
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|e| FabricError::Network(format!("{} request failed: {}", operation, e)))?;

    if !resp.status().is_success() {
        return Err(FabricError::from_response(operation, resp).await);
    }

    resp.json()
        .await
        .map_err(|e| FabricError::Network(format!("{} returned an unreadable body: {}", operation, e)))
}

/// Persist the metadata document to `<dir>/reports_datasets.json`.
pub async fn write_metadata(dir: &Path, metadata: &WorkspaceMetadata) -> Result<std::path::PathBuf, FabricError> {
    let path = dir.join(METADATA_FILE_NAME);
    let content = serde_json::to_string_pretty(metadata)?;
    atomic_write(&path, &content).await?;
    info!(path = %path.display(), reports = metadata.report_count, "Wrote workspace metadata");
    Ok(path)
}
