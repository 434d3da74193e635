use std::path::{Path, PathBuf};
use crate::errors::FabricError;

/// Atomic file write: write to a sibling temp file, then rename over the target.
pub async fn atomic_write(path: &Path, content: &str) -> Result<(), FabricError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = temp_path(path);
    tokio::fs::write(&tmp, content).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

/// Glob pattern for `file_pattern` inside `dir`, with the directory itself matched literally.
pub fn glob_in(dir: &Path, file_pattern: &str) -> String {
    PathBuf::from(glob::Pattern::escape(&dir.to_string_lossy()))
        .join(file_pattern)
        .to_string_lossy()
        .into_owned()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
