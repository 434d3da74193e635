use serde::{Deserialize, Serialize};

use crate::errors::FabricError;

/// Contents of the optional `fabric-ci.yaml` file. Every field is optional; string
/// values of the form `$NAME` are resolved against the environment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub environment: Option<String>,
    pub credentials: Option<CredentialsConfig>,
    pub workspace_id: Option<String>,
    pub rls: Option<RlsConfig>,
    pub paths: Option<PathsConfig>,
    pub probe: Option<ProbeConfig>,
    pub browser: Option<BrowserConfig>,
    pub workers: Option<WorkerCount>,
    pub retries: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CredentialsConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub tenant_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RlsConfig {
    pub default_role: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PathsConfig {
    pub results_dir: Option<String>,
    pub metadata_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProbeConfig {
    pub poll_interval_ms: Option<u64>,
    pub render_timeout_ms: Option<u64>,
    pub screenshot_settle_ms: Option<u64>,
    pub viewport_width: Option<u32>,
    pub viewport_height: Option<u32>,
    pub sdk_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct BrowserConfig {
    pub executable: Option<String>,
    pub headless: Option<bool>,
}

/// BI service cloud. Selects authentication and API hosts.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Prod,
    Gov,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prod => "prod",
            Self::Gov => "gov",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = FabricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prod" => Ok(Self::Prod),
            "gov" => Ok(Self::Gov),
            other => Err(FabricError::Config(format!("Unknown environment: {}", other))),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of parallel worker processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "serde_yaml::Value", into = "String")]
pub enum WorkerCount {
    #[default]
    Auto,
    Fixed(usize),
}

impl WorkerCount {
    /// Concrete process count for `jobs` queued reports; never more workers than jobs,
    /// never fewer than one.
    pub fn resolve(&self, jobs: usize) -> usize {
        let wanted = match self {
            Self::Auto => std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            Self::Fixed(n) => *n,
        };
        wanted.min(jobs).max(1)
    }
}

impl std::str::FromStr for WorkerCount {
    type Err = FabricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        s.parse::<usize>()
            .map(Self::Fixed)
            .map_err(|_| FabricError::Config(format!("Invalid worker count '{}': expected an integer or 'auto'", s)))
    }
}

impl TryFrom<serde_yaml::Value> for WorkerCount {
    type Error = FabricError;

    fn try_from(value: serde_yaml::Value) -> Result<Self, Self::Error> {
        match value {
            serde_yaml::Value::Number(n) => n
                .as_u64()
                .map(|n| Self::Fixed(n as usize))
                .ok_or_else(|| FabricError::Config(format!("Invalid worker count: {}", n))),
            serde_yaml::Value::String(s) => s.parse(),
            other => Err(FabricError::Config(format!("Invalid worker count: {:?}", other))),
        }
    }
}

impl From<WorkerCount> for String {
    fn from(count: WorkerCount) -> Self {
        match count {
            WorkerCount::Auto => "auto".to_string(),
            WorkerCount::Fixed(n) => n.to_string(),
        }
    }
}
