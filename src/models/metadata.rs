use serde::{Deserialize, Serialize};

/// One report entry of the workspace metadata document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReportMetadata {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub embed_url: Option<String>,
    #[serde(default)]
    pub dataset_id: Option<String>,
    #[serde(default)]
    pub dataset_name: String,
    #[serde(default)]
    pub workspace_id: String,
    #[serde(default)]
    pub is_effective_identity_required: bool,
    #[serde(default)]
    pub is_effective_identity_roles_required: bool,
    /// Per-report RLS role; hand-edited into metadata files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark_id: Option<String>,
}

impl ReportMetadata {
    /// Test-case label, `Name (Id)`.
    pub fn case_id(&self) -> String {
        format!("{} ({})", self.name, self.id)
    }
}

/// Document persisted by the metadata refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceMetadata {
    pub workspace_id: String,
    pub generated_at_utc: String,
    pub report_count: usize,
    pub reports: Vec<ReportMetadata>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pascal_case_round_trip_fields() {
        let json = serde_json::json!({
            "Id": "report-123",
            "Name": "Sales",
            "EmbedUrl": "https://app.powerbi.com/reportEmbed?reportId=report-123",
            "DatasetId": "dataset-789",
            "WorkspaceId": "workspace-456",
            "IsEffectiveIdentityRequired": true,
            "IsEffectiveIdentityRolesRequired": false
        });
        let report: ReportMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(report.id, "report-123");
        assert_eq!(report.dataset_id.as_deref(), Some("dataset-789"));
        assert!(report.is_effective_identity_required);
        assert!(report.role.is_none());
        assert_eq!(report.case_id(), "Sales (report-123)");

        let back = serde_json::to_value(&report).unwrap();
        assert!(back.get("Role").is_none());
        assert_eq!(back["WorkspaceId"], "workspace-456");
    }

    #[test]
    fn test_workspace_metadata_keys() {
        let doc = WorkspaceMetadata {
            workspace_id: "ws".into(),
            generated_at_utc: "2026-01-01T00:00:00Z".into(),
            report_count: 0,
            reports: vec![],
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["workspaceId"], "ws");
        assert_eq!(json["reportCount"], 0);
        assert!(json.get("generatedAtUtc").is_some());
    }
}
