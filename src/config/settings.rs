use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{FabricError, RetryConfig};
use super::credentials::{redact_credentials, resolve_credential};
use super::endpoints::ApiEndpoints;
use super::parser::load_optional_config;
use super::types::{Environment, FileConfig, WorkerCount};
use tracing::debug;

pub const DEFAULT_RESULTS_DIR: &str = "tests/test-results";
pub const DEFAULT_METADATA_DIR: &str = "metadata/reports";
pub const DEFAULT_SDK_URL: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/powerbi-client/2.23.1/powerbi.min.js";
const DEFAULT_RLS_USERNAME: &str = "TestUser";

/// Values given on the command line; they win over every other source.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub environment: Option<String>,
    pub workers: Option<WorkerCount>,
    pub results_dir: Option<PathBuf>,
}

/// Service-principal credentials for the client-credentials grant.
#[derive(Clone)]
pub struct ServicePrincipal {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
}

impl std::fmt::Debug for ServicePrincipal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServicePrincipal")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

/// Render-probe timing and embedding knobs.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub poll_interval: Duration,
    pub render_timeout: Duration,
    pub screenshot_settle: Duration,
    pub viewport: (u32, u32),
    pub sdk_url: String,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            render_timeout: Duration::from_millis(15_000),
            screenshot_settle: Duration::from_millis(800),
            viewport: (1280, 800),
            sdk_url: DEFAULT_SDK_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub executable: Option<PathBuf>,
    pub headless: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self { executable: None, headless: true }
    }
}

/// Configuration for one process, built once at startup and passed down by reference.
#[derive(Debug, Clone)]
pub struct Settings {
    pub environment: Environment,
    pub endpoints: ApiEndpoints,
    client_id: Option<String>,
    client_secret: Option<String>,
    tenant_id: Option<String>,
    workspace_id: Option<String>,
    pub default_rls_role: Option<String>,
    pub rls_username: String,
    /// Running under continuous integration; suppresses opening the report.
    pub ci: bool,
    pub results_dir: PathBuf,
    pub metadata_dir: PathBuf,
    pub probe: ProbeSettings,
    pub browser: BrowserSettings,
    pub workers: WorkerCount,
    pub retry: RetryConfig,
}

impl Settings {
    /// Snapshot the process environment, read the config file and resolve.
    pub async fn load(config_path: Option<&Path>, overrides: SettingsOverrides) -> Result<Self, FabricError> {
        let env: HashMap<String, String> = std::env::vars().collect();
        let file = load_optional_config(config_path).await?;
        Self::resolve(file, &env, overrides)
    }

    /// Resolve settings from explicit sources: overrides > file > environment > defaults.
    pub fn resolve(
        file: Option<FileConfig>,
        env: &HashMap<String, String>,
        overrides: SettingsOverrides,
    ) -> Result<Self, FabricError> {
        let file = file.unwrap_or_default();
        let from_file = |v: &Option<String>| v.as_deref().and_then(|s| resolve_credential(s, env));
        let from_env = |name: &str| env.get(name).filter(|v| !v.is_empty()).cloned();

        let environment = match overrides
            .environment
            .or_else(|| from_file(&file.environment))
            .or_else(|| from_env("ENVIRONMENT"))
        {
            Some(raw) => raw.parse()?,
            None => Environment::default(),
        };

        let creds = file.credentials.clone().unwrap_or_default();
        let rls = file.rls.clone().unwrap_or_default();
        let paths = file.paths.clone().unwrap_or_default();
        let probe = file.probe.clone().unwrap_or_default();
        let browser = file.browser.clone().unwrap_or_default();

        let defaults = ProbeSettings::default();
        let probe = ProbeSettings {
            poll_interval: probe.poll_interval_ms.map(Duration::from_millis).unwrap_or(defaults.poll_interval),
            render_timeout: probe.render_timeout_ms.map(Duration::from_millis).unwrap_or(defaults.render_timeout),
            screenshot_settle: probe.screenshot_settle_ms.map(Duration::from_millis).unwrap_or(defaults.screenshot_settle),
            viewport: (
                probe.viewport_width.unwrap_or(defaults.viewport.0),
                probe.viewport_height.unwrap_or(defaults.viewport.1),
            ),
            sdk_url: from_file(&probe.sdk_url).unwrap_or(defaults.sdk_url),
        };

        let settings = Self {
            environment,
            endpoints: ApiEndpoints::for_environment(environment),
            client_id: from_file(&creds.client_id).or_else(|| from_env("SP_CLIENT_ID")),
            client_secret: from_file(&creds.client_secret).or_else(|| from_env("SP_CLIENT_SECRET")),
            tenant_id: from_file(&creds.tenant_id).or_else(|| from_env("SP_TENANT_ID")),
            workspace_id: from_file(&file.workspace_id).or_else(|| from_env("WORKSPACE_ID")),
            default_rls_role: from_file(&rls.default_role).or_else(|| from_env("DEFAULT_RLS_ROLE")),
            rls_username: from_file(&rls.username).unwrap_or_else(|| DEFAULT_RLS_USERNAME.to_string()),
            ci: from_env("CI").is_some(),
            results_dir: overrides
                .results_dir
                .or_else(|| from_file(&paths.results_dir).map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_DIR)),
            metadata_dir: from_file(&paths.metadata_dir)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_METADATA_DIR)),
            probe,
            browser: BrowserSettings {
                executable: from_file(&browser.executable).map(PathBuf::from),
                headless: browser.headless.unwrap_or(true),
            },
            workers: overrides.workers.or(file.workers).unwrap_or_default(),
            retry: RetryConfig {
                max_retries: file.retries.unwrap_or(RetryConfig::default().max_retries),
            },
        };

        debug!(
            environment = %settings.environment,
            results_dir = %settings.results_dir.display(),
            metadata_dir = %settings.metadata_dir.display(),
            ci = settings.ci,
            "Settings resolved"
        );
        Ok(settings)
    }

    /// Credentials for the service principal; every missing variable is named at once.
    pub fn service_principal(&self) -> Result<ServicePrincipal, FabricError> {
        let missing: Vec<&str> = [
            ("SP_CLIENT_ID", &self.client_id),
            ("SP_TENANT_ID", &self.tenant_id),
            ("SP_CLIENT_SECRET", &self.client_secret),
        ]
        .iter()
        .filter(|(_, v)| v.is_none())
        .map(|(name, _)| *name)
        .collect();

        match (&self.client_id, &self.client_secret, &self.tenant_id) {
            (Some(id), Some(secret), Some(tenant)) => Ok(ServicePrincipal {
                client_id: id.clone(),
                client_secret: secret.clone(),
                tenant_id: tenant.clone(),
            }),
            _ => Err(FabricError::Config(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            ))),
        }
    }

    /// Required variables that resolved to nothing, in a fixed order.
    pub fn missing_required(&self) -> Vec<&'static str> {
        [
            ("SP_CLIENT_ID", self.client_id.is_none()),
            ("SP_TENANT_ID", self.tenant_id.is_none()),
            ("SP_CLIENT_SECRET", self.client_secret.is_none()),
            ("WORKSPACE_ID", self.workspace_id.is_none()),
        ]
        .into_iter()
        .filter(|(_, missing)| *missing)
        .map(|(name, _)| name)
        .collect()
    }

    /// Config error naming every missing variable; call before any network access.
    pub fn require_complete(&self) -> Result<(), FabricError> {
        let missing = self.missing_required();
        if missing.is_empty() {
            return Ok(());
        }
        Err(FabricError::Config(format!(
            "Missing required environment variables: {}",
            missing.join(", ")
        )))
    }

    pub fn workspace_id(&self) -> Result<&str, FabricError> {
        self.workspace_id
            .as_deref()
            .ok_or_else(|| FabricError::Config("Missing required environment variables: WORKSPACE_ID".into()))
    }

    /// Canonical aggregated artifact.
    pub fn final_json_path(&self) -> PathBuf {
        self.results_dir.join("all_reports_results.json")
    }

    /// Rendered document.
    pub fn report_html_path(&self) -> PathBuf {
        self.results_dir.join("report.html")
    }

    /// Metadata document written by a refresh.
    pub fn metadata_output_path(&self) -> PathBuf {
        self.metadata_dir.join("reports_datasets.json")
    }

    /// Strip secrets from text that may echo request bodies.
    pub fn redact(&self, text: &str) -> String {
        let secrets: Vec<&str> = self.client_secret.iter().map(String::as_str).collect();
        redact_credentials(text, &secrets)
    }
}
