use thiserror::Error;

#[derive(Debug, Error)]
pub enum FabricError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{operation} failed ({status}): {body}")]
    Upstream {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid report metadata: {0}")]
    InvalidReport(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("{0} report test(s) failed")]
    TestsFailed(usize),

    #[error("{0} pre-flight check(s) failed")]
    PreflightFailed(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FabricError {
    /// Build an upstream error from a non-success HTTP response, keeping the body text.
    pub async fn from_response(operation: &str, resp: reqwest::Response) -> Self {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        FabricError::Upstream {
            operation: operation.to_string(),
            status,
            body,
        }
    }

    /// Process exit status for a command that ended with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            FabricError::Config(_) => 2,
            FabricError::Upstream { .. } | FabricError::Authentication(_) => 3,
            FabricError::Io(_) => 4,
            _ => 1,
        }
    }
}

impl From<chromiumoxide::error::CdpError> for FabricError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        FabricError::Browser(e.to_string())
    }
}

impl From<glob::PatternError> for FabricError {
    fn from(e: glob::PatternError) -> Self {
        FabricError::Internal(format!("Invalid glob pattern: {}", e))
    }
}
