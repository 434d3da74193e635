use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use crate::config::{ApiEndpoints, Settings};
use crate::errors::{with_retry, FabricError, RetryConfig};
use crate::models::ReportMetadata;
use tracing::debug;

/// Everything needed to request an embed token for one report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEmbedInfo {
    pub report_id: String,
    pub workspace_id: String,
    pub dataset_id: Option<String>,
    pub page_id: Option<String>,
    pub role: Option<String>,
    pub bookmark_id: Option<String>,
    pub is_effective_identity_required: bool,
    pub is_effective_identity_roles_required: bool,
}

impl ReportEmbedInfo {
    pub fn from_metadata(report: &ReportMetadata) -> Result<Self, FabricError> {
        if report.workspace_id.is_empty() {
            return Err(FabricError::InvalidReport(format!("Report {} is missing WorkspaceId", report.name)));
        }
        if report.id.is_empty() {
            return Err(FabricError::InvalidReport(format!("Report {} is missing reportId", report.name)));
        }

        Ok(Self {
            report_id: report.id.clone(),
            workspace_id: report.workspace_id.clone(),
            dataset_id: report.dataset_id.clone().filter(|d| !d.is_empty()),
            page_id: report.pages.first().cloned(),
            role: report.role.clone().filter(|r| !r.is_empty()),
            bookmark_id: report.bookmark_id.clone(),
            is_effective_identity_required: report.is_effective_identity_required,
            is_effective_identity_roles_required: report.is_effective_identity_roles_required,
        })
    }
}

/// Issues short-lived embed tokens.
#[async_trait]
pub trait EmbedTokenIssuer: Send + Sync {
    async fn embed_token(&self, info: &ReportEmbedInfo) -> Result<String, FabricError>;
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTokenRequest {
    pub access_level: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identities: Option<Vec<EffectiveIdentity>>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct EffectiveIdentity {
    pub username: String,
    pub datasets: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

/// Build the GenerateToken body. The identity is included only when the dataset
/// requires one; roles only when the dataset also requires roles and a role is known.
pub fn build_token_request(
    info: &ReportEmbedInfo,
    default_role: Option<&str>,
    username: &str,
) -> GenerateTokenRequest {
    let identities = match (&info.dataset_id, info.is_effective_identity_required) {
        (Some(dataset_id), true) => {
            let role = info.role.as_deref().or(default_role);
            let roles = match (info.is_effective_identity_roles_required, role) {
                (true, Some(role)) => Some(vec![role.to_string()]),
                _ => None,
            };
            Some(vec![EffectiveIdentity {
                username: username.to_string(),
                datasets: vec![dataset_id.clone()],
                roles,
            }])
        }
        _ => None,
    };

    GenerateTokenRequest { access_level: "View", identities }
}

/// REST-backed embed token issuer bound to one access token.
pub struct TokenClient {
    client: Client,
    endpoints: ApiEndpoints,
    access_token: String,
    default_role: Option<String>,
    username: String,
    retry: RetryConfig,
}

impl TokenClient {
    pub fn new(client: Client, settings: &Settings, access_token: String) -> Self {
        Self {
            client,
            endpoints: settings.endpoints.clone(),
            access_token,
            default_role: settings.default_rls_role.clone(),
            username: settings.rls_username.clone(),
            retry: settings.retry.clone(),
        }
    }

    async fn request_embed_token(&self, info: &ReportEmbedInfo, body: &GenerateTokenRequest) -> Result<String, FabricError> {
        let url = format!(
            "{}/reports/{}/GenerateToken",
            self.endpoints.group_url(&info.workspace_id),
            info.report_id
        );

        let resp = self.client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| FabricError::Network(format!("GenerateToken request failed: {}", e)))?;

        if !resp.status().is_success() {
            let operation = format!("GenerateToken for report {}", info.report_id);
            return Err(FabricError::from_response(&operation, resp).await);
        }

        let data: serde_json::Value = resp.json().await
            .map_err(|e| FabricError::Authentication(format!("Unreadable GenerateToken response: {}", e)))?;

        data["token"]
            .as_str()
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .ok_or_else(|| FabricError::Authentication(format!(
                "Failed to get embed token for report {}: {}",
                info.report_id, data
            )))
    }
}

#[async_trait]
impl EmbedTokenIssuer for TokenClient {
    async fn embed_token(&self, info: &ReportEmbedInfo) -> Result<String, FabricError> {
        let body = build_token_request(info, self.default_role.as_deref(), &self.username);
        debug!(
            report_id = %info.report_id,
            with_identity = body.identities.is_some(),
            "Requesting embed token"
        );
        with_retry("embed token", &self.retry, || self.request_embed_token(info, &body)).await
    }
}
