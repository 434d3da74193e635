pub mod commands;
pub mod init;
pub mod fetch;
pub mod preflight;
pub mod test;
pub mod worker;
pub mod aggregate;
pub mod report;

use std::time::Duration;

use crate::config::{Settings, SettingsOverrides};
use crate::errors::FabricError;

pub use commands::{Cli, Commands};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

async fn load_settings(cli: &Cli, overrides: SettingsOverrides) -> Result<Settings, FabricError> {
    Settings::load(cli.config.as_deref(), overrides).await
}

fn http_client() -> Result<reqwest::Client, FabricError> {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| FabricError::Network(format!("Failed to build HTTP client: {}", e)))
}
