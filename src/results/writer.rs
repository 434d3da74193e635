use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::FabricError;
use crate::models::ReportResult;
use crate::utils::fs::atomic_write;

/// Glob matched by every worker result file.
pub const RESULT_FILE_PATTERN: &str = "results_*.json";

pub fn result_file_name(worker_id: &str) -> String {
    format!("results_{}.json", worker_id)
}

/// Append-only result file owned by exactly one worker.
#[derive(Debug)]
pub struct ResultWriter {
    path: PathBuf,
    started: bool,
}

impl ResultWriter {
    pub fn new(results_dir: &Path, worker_id: &str) -> Self {
        Self {
            path: results_dir.join(result_file_name(worker_id)),
            started: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current sequence, append `result`, rewrite the file.
    ///
    /// The first append of a session ignores leftovers from an earlier run.
    pub async fn append(&mut self, result: &ReportResult) -> Result<(), FabricError> {
        let mut existing: Vec<ReportResult> = if self.started {
            match tokio::fs::read_to_string(&self.path).await {
                Ok(content) => serde_json::from_str(&content)?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
                Err(e) => return Err(e.into()),
            }
        } else {
            Vec::new()
        };

        existing.push(result.clone());
        let content = serde_json::to_string_pretty(&existing)?;
        atomic_write(&self.path, &content).await?;
        self.started = true;

        debug!(
            path = %self.path.display(),
            report_id = %result.report_id,
            entries = existing.len(),
            "Appended report result"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderedMap;
    use tempfile::TempDir;

    fn result(id: &str) -> ReportResult {
        ReportResult {
            report_id: id.into(),
            report_name: format!("Report {}", id),
            environment: "prod".into(),
            pages: OrderedMap::new(),
            failed_pages: vec![],
            report_load_time: 0.0,
            total_duration: 0.0,
            test_duration: 0.0,
        }
    }

    async fn read(path: &Path) -> Vec<ReportResult> {
        serde_json::from_str(&tokio::fs::read_to_string(path).await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_appends_in_order() {
        let dir = TempDir::new().unwrap();
        let mut writer = ResultWriter::new(dir.path(), "gw0");
        writer.append(&result("a")).await.unwrap();
        writer.append(&result("b")).await.unwrap();

        assert_eq!(writer.path(), dir.path().join("results_gw0.json"));
        let ids: Vec<String> = read(writer.path()).await.into_iter().map(|r| r.report_id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_first_append_truncates_stale_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("results_master.json"), "[{\"broken\": true").unwrap();

        let mut writer = ResultWriter::new(dir.path(), "master");
        writer.append(&result("fresh")).await.unwrap();
        let stored = read(writer.path()).await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].report_id, "fresh");
    }

    #[tokio::test]
    async fn test_creates_results_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("tests").join("test-results");
        let mut writer = ResultWriter::new(&nested, "gw3");
        writer.append(&result("a")).await.unwrap();
        assert!(nested.join("results_gw3.json").exists());
    }
}
