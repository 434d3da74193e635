use super::types::FabricError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub retryable: bool,
}

impl FabricError {
    /// Classify this error to determine its type and whether it can be retried.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            FabricError::Network(_) => ErrorClassification {
                error_type: "NetworkError",
                retryable: true,
            },
            FabricError::Timeout(_) => ErrorClassification {
                error_type: "TimeoutError",
                retryable: true,
            },
            FabricError::Upstream { status: 429, .. } => ErrorClassification {
                error_type: "RateLimitError",
                retryable: true,
            },
            FabricError::Upstream { status, .. } if *status >= 500 => ErrorClassification {
                error_type: "UpstreamServerError",
                retryable: true,
            },
            FabricError::Upstream { .. } => ErrorClassification {
                error_type: "UpstreamError",
                retryable: false,
            },
            FabricError::Authentication(_) => ErrorClassification {
                error_type: "AuthenticationError",
                retryable: false,
            },
            FabricError::Config(_) => ErrorClassification {
                error_type: "ConfigError",
                retryable: false,
            },
            FabricError::InvalidReport(_) => ErrorClassification {
                error_type: "InvalidReportError",
                retryable: false,
            },
            FabricError::Browser(_) => ErrorClassification {
                error_type: "BrowserError",
                retryable: false,
            },
            FabricError::Session(_) => ErrorClassification {
                error_type: "SessionError",
                retryable: false,
            },
            FabricError::TestsFailed(_) => ErrorClassification {
                error_type: "TestsFailed",
                retryable: false,
            },
            FabricError::PreflightFailed(_) => ErrorClassification {
                error_type: "PreflightFailed",
                retryable: false,
            },
            FabricError::Io(_) => ErrorClassification {
                error_type: "IoError",
                retryable: false,
            },
            FabricError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                retryable: false,
            },
            FabricError::Yaml(_) => ErrorClassification {
                error_type: "YamlError",
                retryable: false,
            },
            FabricError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                retryable: false,
            },
        }
    }
}
