use std::collections::HashSet;
use std::path::Path;

use tracing::warn;

use crate::errors::FabricError;
use crate::models::ReportMetadata;
use crate::utils::fs::glob_in;

/// Flatten the `reports` arrays of every `*.json` file in `dir`.
///
/// Unreadable or malformed files are skipped with a warning. Files are visited in
/// sorted order so the returned list is stable.
pub async fn load_reports(dir: &Path) -> Result<Vec<ReportMetadata>, FabricError> {
    let meta = tokio::fs::metadata(dir).await.map_err(|e| {
        FabricError::Io(std::io::Error::new(
            e.kind(),
            format!("Folder does not exist: {}", dir.display()),
        ))
    })?;
    if !meta.is_dir() {
        return Err(FabricError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Path is not a folder: {}", dir.display()),
        )));
    }

    let mut all = Vec::new();
    for entry in glob::glob(&glob_in(dir, "*.json"))? {
        let path = match entry {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable metadata entry");
                continue;
            }
        };
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read metadata file");
                continue;
            }
        };
        let doc: serde_json::Value = match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to parse metadata file");
                continue;
            }
        };
        match doc.get("reports") {
            None => {}
            Some(serde_json::Value::Array(items)) => {
                for item in items {
                    match serde_json::from_value::<ReportMetadata>(item.clone()) {
                        Ok(report) => all.push(report),
                        Err(e) => warn!(path = %path.display(), error = %e, "Skipping malformed report entry"),
                    }
                }
            }
            Some(_) => warn!(path = %path.display(), "'reports' is not a list"),
        }
    }
    Ok(all)
}

/// Keep reports whose `Name (Id)` label matches `pattern`.
pub fn filter_reports(reports: Vec<ReportMetadata>, pattern: Option<&str>) -> Result<Vec<ReportMetadata>, FabricError> {
    let Some(pattern) = pattern else {
        return Ok(reports);
    };
    let re = regex::Regex::new(pattern)
        .map_err(|e| FabricError::Config(format!("Invalid report filter '{}': {}", pattern, e)))?;
    Ok(reports.into_iter().filter(|r| re.is_match(&r.case_id())).collect())
}

/// A metadata problem that makes a report unscannable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportIssue {
    pub report: String,
    pub problem: String,
}

/// Required fields present and ids unique.
pub fn validate_reports(reports: &[ReportMetadata]) -> Vec<ReportIssue> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for (idx, r) in reports.iter().enumerate() {
        let label = if r.name.is_empty() { format!("#{}", idx + 1) } else { r.name.clone() };
        let mut missing = Vec::new();
        if r.id.is_empty() {
            missing.push("Id");
        }
        if r.name.is_empty() {
            missing.push("Name");
        }
        if r.embed_url.as_deref().map_or(true, str::is_empty) {
            missing.push("EmbedUrl");
        }
        if r.workspace_id.is_empty() {
            missing.push("WorkspaceId");
        }
        if !missing.is_empty() {
            issues.push(ReportIssue {
                report: label.clone(),
                problem: format!("missing {}", missing.join(", ")),
            });
        }
        if !r.id.is_empty() && !seen.insert(r.id.as_str()) {
            issues.push(ReportIssue { report: label, problem: format!("duplicate Id {}", r.id) });
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_flattens_multiple_files() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.json"), r#"{"reports":[{"Id":"1","Name":"A"}]}"#).unwrap();
        std::fs::write(
            tmp.path().join("b.json"),
            r#"{"reports":[{"Id":"2","Name":"B"},{"Id":"3","Name":"C"}]}"#,
        )
        .unwrap();
        let reports = load_reports(tmp.path()).await.unwrap();
        let ids: Vec<_> = reports.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_skips_malformed_and_missing_reports() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("bad.json"), "{ not json").unwrap();
        std::fs::write(tmp.path().join("empty.json"), r#"{"other": 1}"#).unwrap();
        std::fs::write(tmp.path().join("notlist.json"), r#"{"reports": {"Id": "x"}}"#).unwrap();
        std::fs::write(tmp.path().join("good.json"), r#"{"reports":[{"Id":"1","Name":"A"}]}"#).unwrap();
        std::fs::write(tmp.path().join("ignored.txt"), r#"{"reports":[{"Id":"9"}]}"#).unwrap();
        let reports = load_reports(tmp.path()).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].id, "1");
    }

    #[tokio::test]
    async fn test_folder_name_with_brackets() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("reports[prod]");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("a.json"), r#"{"reports":[{"Id":"1","Name":"A"}]}"#).unwrap();
        let reports = load_reports(&dir).await.unwrap();
        assert_eq!(reports.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_folder_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_reports(&tmp.path().join("nope")).await.unwrap_err();
        assert!(matches!(err, FabricError::Io(_)));
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_file_path_is_error() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("x.json");
        std::fs::write(&file, "{}").unwrap();
        let err = load_reports(&file).await.unwrap_err();
        assert!(err.to_string().contains("not a folder"));
    }

    fn complete(id: &str, name: &str) -> ReportMetadata {
        ReportMetadata {
            id: id.into(),
            name: name.into(),
            embed_url: Some(format!("https://app.powerbi.com/reportEmbed?reportId={}", id)),
            workspace_id: "ws".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_filter_matches_case_label() {
        let reports = vec![complete("r-1", "Sales"), complete("r-2", "Finance"), complete("r-3", "Sales EMEA")];
        let picked = filter_reports(reports.clone(), Some("^Sales")).unwrap();
        assert_eq!(picked.len(), 2);
        let by_id = filter_reports(reports.clone(), Some(r"\(r-2\)")).unwrap();
        assert_eq!(by_id[0].name, "Finance");
        assert_eq!(filter_reports(reports, None).unwrap().len(), 3);
        assert!(matches!(filter_reports(vec![], Some("(")), Err(FabricError::Config(_))));
    }

    #[test]
    fn test_validate_clean() {
        assert!(validate_reports(&[complete("1", "A"), complete("2", "B")]).is_empty());
    }

    #[test]
    fn test_validate_missing_fields_and_duplicates() {
        let mut broken = complete("1", "B");
        broken.embed_url = None;
        broken.workspace_id.clear();
        let issues = validate_reports(&[complete("1", "A"), broken]);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].problem, "missing EmbedUrl, WorkspaceId");
        assert_eq!(issues[1].problem, "duplicate Id 1");
    }
}
