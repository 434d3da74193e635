use reqwest::Client;
use serde::Deserialize;
use crate::config::{ApiEndpoints, ServicePrincipal};
use crate::errors::{with_retry, FabricError, RetryConfig};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Exchange service-principal credentials for a bearer token (client-credentials grant).
pub async fn get_access_token(
    client: &Client,
    endpoints: &ApiEndpoints,
    principal: &ServicePrincipal,
    retry: &RetryConfig,
) -> Result<String, FabricError> {
    let url = endpoints.token_url(&principal.tenant_id);
    debug!(url = %url, client_id = %principal.client_id, "Requesting access token");

    let token = with_retry("access token", retry, || request_token(client, &url, endpoints, principal)).await?;
    info!("Access token acquired");
    Ok(token)
}

async fn request_token(
    client: &Client,
    url: &str,
    endpoints: &ApiEndpoints,
    principal: &ServicePrincipal,
) -> Result<String, FabricError> {
    let form = [
        ("grant_type", "client_credentials"),
        ("client_id", principal.client_id.as_str()),
        ("client_secret", principal.client_secret.as_str()),
        ("scope", endpoints.scope.as_str()),
    ];

    let resp = client
        .post(url)
        .form(&form)
        .send()
        .await
        .map_err(|e| FabricError::Network(format!("Token request failed: {}", e)))?;

    if !resp.status().is_success() {
        return Err(FabricError::from_response("Access token request", resp).await);
    }

    let body: TokenResponse = resp
        .json()
        .await
        .map_err(|e| FabricError::Authentication(format!("Unreadable token response: {}", e)))?;

    body.access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| FabricError::Authentication("Failed to get access token: no access_token in response".into()))
}
