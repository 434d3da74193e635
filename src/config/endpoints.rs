use super::types::Environment;

/// Host prefixes for one BI cloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    /// Identity provider, tenant id is appended.
    pub login_prefix: String,
    /// OAuth scope requested for the client-credentials grant.
    pub scope: String,
    /// REST API host.
    pub api_prefix: String,
    /// Web app host used for deep links.
    pub web_prefix: String,
}

impl ApiEndpoints {
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Prod => Self {
                login_prefix: "https://login.microsoftonline.com".into(),
                scope: "https://analysis.windows.net/powerbi/api/.default".into(),
                api_prefix: "https://api.powerbi.com".into(),
                web_prefix: "https://app.powerbi.com".into(),
            },
            Environment::Gov => Self {
                login_prefix: "https://login.microsoftonline.us".into(),
                scope: "https://analysis.usgovcloudapi.net/powerbi/api/.default".into(),
                api_prefix: "https://api.powerbigov.us".into(),
                web_prefix: "https://app.powerbigov.us".into(),
            },
        }
    }

    /// Point every host at one base URL. Used against local mock servers.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            login_prefix: format!("{}/login", base),
            scope: "https://analysis.windows.net/powerbi/api/.default".into(),
            api_prefix: format!("{}/api", base),
            web_prefix: format!("{}/app", base),
        }
    }

    pub fn token_url(&self, tenant_id: &str) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.login_prefix, tenant_id)
    }

    pub fn group_url(&self, workspace_id: &str) -> String {
        format!("{}/v1.0/myorg/groups/{}", self.api_prefix, workspace_id)
    }

    pub fn service_page_url(&self, workspace_id: &str, report_id: &str, page: &str) -> String {
        format!("{}/groups/{}/reports/{}/{}", self.web_prefix, workspace_id, report_id, page)
    }

    pub fn embed_page_url(&self, report_id: &str, page: &str) -> String {
        format!("{}/reportEmbed?reportId={}&pageName={}", self.web_prefix, report_id, page)
    }
}
