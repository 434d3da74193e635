use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::errors::FabricError;

pub const LOCK_FILE: &str = ".coordinator.lock";

/// Exclusive claim on a results directory for one coordinating session.
#[derive(Debug)]
pub struct CoordinatorLock {
    path: PathBuf,
    released: bool,
}

impl CoordinatorLock {
    pub async fn acquire(results_dir: &Path, session_id: &str) -> Result<Self, FabricError> {
        tokio::fs::create_dir_all(results_dir).await?;
        let path = results_dir.join(LOCK_FILE);

        let mut file = match tokio::fs::OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let holder = tokio::fs::read_to_string(&path).await.unwrap_or_default();
                return Err(FabricError::Session(format!(
                    "Another session holds {} ({}). Remove the file if no other run is active.",
                    path.display(),
                    holder.trim()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(format!("session={} pid={}\n", session_id, std::process::id()).as_bytes())
            .await?;
        debug!(path = %path.display(), session_id, "Acquired coordinator lock");

        Ok(Self { path, released: false })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn release(mut self) -> Result<(), FabricError> {
        self.released = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for CoordinatorLock {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "Failed to remove coordinator lock");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_second_acquire_fails_until_release() {
        let dir = TempDir::new().unwrap();
        let lock = CoordinatorLock::acquire(dir.path(), "s1").await.unwrap();
        assert!(lock.path().exists());

        let err = CoordinatorLock::acquire(dir.path(), "s2").await.unwrap_err();
        assert!(matches!(err, FabricError::Session(_)));
        assert!(err.to_string().contains("session=s1"));

        lock.release().await.unwrap();
        let again = CoordinatorLock::acquire(dir.path(), "s3").await.unwrap();
        drop(again);
        assert!(!dir.path().join(LOCK_FILE).exists());
    }
}
