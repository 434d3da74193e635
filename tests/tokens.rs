mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Form, Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;

use common::{serve, test_settings};
use fabric_ci_test::auth::{get_access_token, EmbedTokenIssuer, ReportEmbedInfo, TokenClient};
use fabric_ci_test::errors::FabricError;
use fabric_ci_test::models::ReportMetadata;

type Seen = Arc<Mutex<Vec<Value>>>;

async fn token_ok(Path(tenant): Path<String>, Form(form): Form<HashMap<String, String>>) -> Json<Value> {
    assert_eq!(tenant, "tenant-1");
    assert_eq!(form["grant_type"], "client_credentials");
    assert_eq!(form["client_id"], "client-1");
    assert_eq!(form["client_secret"], "s3cret");
    assert!(form["scope"].ends_with("/.default"));
    Json(json!({"access_token": "aad-token", "token_type": "Bearer"}))
}

async fn generate_token(
    State(seen): State<Seen>,
    Path((ws, report)): Path<(String, String)>,
    headers: axum::http::HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    assert_eq!(headers["authorization"], "Bearer aad-token");
    seen.lock().unwrap().push(json!({"ws": ws, "report": report, "body": body}));
    if report == "forbidden" {
        return (StatusCode::FORBIDDEN, Json(json!({"error": {"code": "PowerBINotAuthorizedException"}})));
    }
    (StatusCode::OK, Json(json!({"token": format!("embed-{}", report), "expiration": "2026-01-01T01:00:00Z"})))
}

async fn embed_server() -> (String, Seen) {
    let seen: Seen = Arc::default();
    let router = Router::new()
        .route("/login/:tenant/oauth2/v2.0/token", post(token_ok))
        .route("/api/v1.0/myorg/groups/:ws/reports/:report/GenerateToken", post(generate_token))
        .with_state(seen.clone());
    (serve(router).await, seen)
}

fn metadata(id: &str) -> ReportMetadata {
    ReportMetadata {
        id: id.into(),
        name: "Sales".into(),
        workspace_id: "ws-1".into(),
        dataset_id: Some("ds-1".into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_access_token_success() {
    let tmp = TempDir::new().unwrap();
    let (base, _) = embed_server().await;
    let settings = test_settings(&base, tmp.path(), true);

    let token = get_access_token(
        &reqwest::Client::new(),
        &settings.endpoints,
        &settings.service_principal().unwrap(),
        &settings.retry,
    )
    .await
    .unwrap();
    assert_eq!(token, "aad-token");
}

#[tokio::test]
async fn test_access_token_missing_from_response() {
    let tmp = TempDir::new().unwrap();
    let router = Router::new().route(
        "/login/:tenant/oauth2/v2.0/token",
        post(|| async { Json(json!({"error": "invalid_client"})) }),
    );
    let base = serve(router).await;
    let settings = test_settings(&base, tmp.path(), true);

    let err = get_access_token(
        &reqwest::Client::new(),
        &settings.endpoints,
        &settings.service_principal().unwrap(),
        &settings.retry,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, FabricError::Authentication(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_access_token_rejected_status() {
    let tmp = TempDir::new().unwrap();
    let router = Router::new().route(
        "/login/:tenant/oauth2/v2.0/token",
        post(|| async { (StatusCode::UNAUTHORIZED, "AADSTS7000215: Invalid client secret") }),
    );
    let base = serve(router).await;
    let settings = test_settings(&base, tmp.path(), true);

    let err = get_access_token(
        &reqwest::Client::new(),
        &settings.endpoints,
        &settings.service_principal().unwrap(),
        &settings.retry,
    )
    .await
    .unwrap_err();
    match err {
        FabricError::Upstream { status, body, .. } => {
            assert_eq!(status, 401);
            assert!(body.contains("AADSTS7000215"));
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_embed_token_without_identity() {
    let tmp = TempDir::new().unwrap();
    let (base, seen) = embed_server().await;
    let settings = test_settings(&base, tmp.path(), true);
    let client = TokenClient::new(reqwest::Client::new(), &settings, "aad-token".into());

    let info = ReportEmbedInfo::from_metadata(&metadata("r1")).unwrap();
    assert_eq!(client.embed_token(&info).await.unwrap(), "embed-r1");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["ws"], "ws-1");
    assert_eq!(seen[0]["body"], json!({"accessLevel": "View"}));
}

#[tokio::test]
async fn test_embed_token_sends_effective_identity() {
    let tmp = TempDir::new().unwrap();
    let (base, seen) = embed_server().await;
    let mut settings = test_settings(&base, tmp.path(), true);
    settings.default_rls_role = Some("Viewer".into());
    let client = TokenClient::new(reqwest::Client::new(), &settings, "aad-token".into());

    let mut report = metadata("r2");
    report.is_effective_identity_required = true;
    report.is_effective_identity_roles_required = true;
    let info = ReportEmbedInfo::from_metadata(&report).unwrap();
    client.embed_token(&info).await.unwrap();

    let body = seen.lock().unwrap()[0]["body"].clone();
    assert_eq!(
        body,
        json!({
            "accessLevel": "View",
            "identities": [{"username": "TestUser", "datasets": ["ds-1"], "roles": ["Viewer"]}]
        })
    );
}

#[tokio::test]
async fn test_embed_token_forbidden_is_upstream_error() {
    let tmp = TempDir::new().unwrap();
    let (base, seen) = embed_server().await;
    let settings = test_settings(&base, tmp.path(), true);
    let client = TokenClient::new(reqwest::Client::new(), &settings, "aad-token".into());

    let info = ReportEmbedInfo::from_metadata(&metadata("forbidden")).unwrap();
    let err = client.embed_token(&info).await.unwrap_err();

    assert!(matches!(err, FabricError::Upstream { status: 403, .. }), "got {:?}", err);
    assert!(!err.classify().retryable);
    assert_eq!(seen.lock().unwrap().len(), 1);
}
