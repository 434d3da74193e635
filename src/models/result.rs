use serde::{Deserialize, Serialize};

use super::ordered::OrderedMap;

/// Message recorded for a visual that never signalled "rendered".
pub const VISUAL_TIMEOUT_MESSAGE: &str = "Visual did not render within timeout";

/// One visual element discovered on a page at activation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualElement {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub kind: String,
}

impl VisualElement {
    /// Display title, falling back to the identifier.
    pub fn label(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => &self.id,
        }
    }
}

/// Render state of one visual as persisted in a page result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualStatus {
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub rendered: bool,
}

/// Outcome of scanning one report page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    /// Error key (visual title or `report-error-<n>`) to message. Empty means pass.
    #[serde(default)]
    pub errors: OrderedMap<String>,
    #[serde(default)]
    pub visuals: OrderedMap<VisualStatus>,
    /// Page scan time in milliseconds.
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub embed_url: String,
    #[serde(default)]
    pub service_url: String,
}

impl PageResult {
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

/// All page results for one report, as appended to a worker result file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResult {
    pub report_id: String,
    pub report_name: String,
    #[serde(default)]
    pub environment: String,
    /// Page name to result, in page discovery order.
    #[serde(default)]
    pub pages: OrderedMap<PageResult>,
    #[serde(default)]
    pub failed_pages: Vec<String>,
    /// Milliseconds until the embedded report signalled `loaded`.
    #[serde(default)]
    pub report_load_time: f64,
    /// Milliseconds spent embedding and scanning every page.
    #[serde(default)]
    pub total_duration: f64,
    /// Wall-clock milliseconds for the whole per-report test, tokens and screenshots included.
    #[serde(default)]
    pub test_duration: f64,
}

impl ReportResult {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn failed_page_count(&self) -> usize {
        self.pages.values().filter(|p| !p.passed()).count()
    }

    pub fn passed(&self) -> bool {
        self.failed_page_count() == 0
    }

    pub fn failing_pages(&self) -> impl Iterator<Item = (&str, &PageResult)> {
        self.pages.iter().filter(|(_, p)| !p.passed())
    }
}
