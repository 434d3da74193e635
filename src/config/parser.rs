use std::path::Path;
use crate::errors::FabricError;
use super::types::FileConfig;
use tracing::{debug, warn};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "fabric-ci.yaml";

const MAX_CONFIG_BYTES: u64 = 1_048_576;

pub async fn parse_config(path: &Path) -> Result<FileConfig, FabricError> {
    if !path.exists() {
        return Err(FabricError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > MAX_CONFIG_BYTES {
        return Err(FabricError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    if content.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    let config: FileConfig = serde_yaml::from_str(&content)?;

    validate_probe_timing(&config)?;
    debug!(path = %path.display(), "Loaded config file");

    Ok(config)
}

/// Load an explicit config path, or the default file if it exists.
pub async fn load_optional_config(path: Option<&Path>) -> Result<Option<FileConfig>, FabricError> {
    match path {
        Some(p) => parse_config(p).await.map(Some),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.exists() {
                parse_config(default).await.map(Some)
            } else {
                Ok(None)
            }
        }
    }
}

fn validate_probe_timing(config: &FileConfig) -> Result<(), FabricError> {
    let Some(probe) = &config.probe else {
        return Ok(());
    };
    if probe.poll_interval_ms == Some(0) {
        return Err(FabricError::Config("probe.poll_interval_ms must be greater than zero".into()));
    }
    if let (Some(poll), Some(timeout)) = (probe.poll_interval_ms, probe.render_timeout_ms) {
        if poll > timeout {
            warn!(poll, timeout, "Poll interval exceeds render timeout; pages get a single check");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let err = parse_config(Path::new("/nonexistent/fabric-ci.yaml")).await.unwrap_err();
        assert!(matches!(err, FabricError::Config(_)));
    }

    #[tokio::test]
    async fn test_parses_nested_sections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fabric-ci.yaml");
        std::fs::write(
            &path,
            "environment: gov\nworkers: 4\nprobe:\n  render_timeout_ms: 20000\npaths:\n  results_dir: out\n",
        ).unwrap();

        let config = parse_config(&path).await.unwrap();
        assert_eq!(config.environment.as_deref(), Some("gov"));
        assert_eq!(config.workers, Some(crate::config::WorkerCount::Fixed(4)));
        assert_eq!(config.probe.unwrap().render_timeout_ms, Some(20000));
        assert_eq!(config.paths.unwrap().results_dir.as_deref(), Some("out"));
    }

    #[tokio::test]
    async fn test_empty_file_is_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fabric-ci.yaml");
        std::fs::write(&path, "\n").unwrap();
        let config = parse_config(&path).await.unwrap();
        assert!(config.environment.is_none());
    }

    #[tokio::test]
    async fn test_zero_poll_interval_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fabric-ci.yaml");
        std::fs::write(&path, "probe:\n  poll_interval_ms: 0\n").unwrap();
        assert!(matches!(parse_config(&path).await.unwrap_err(), FabricError::Config(_)));
    }
}
