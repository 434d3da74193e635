use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;
use tokio::time::Instant;
use tracing::{info, warn};

use super::lock::CoordinatorLock;
use super::state::{SessionPhase, SessionRole};
use crate::auth::get_access_token;
use crate::config::Settings;
use crate::errors::FabricError;
use crate::metadata::{fetch_workspace_metadata, write_metadata};
use crate::models::FinalReport;
use crate::reporting::write_report;
use crate::results::{aggregate, RESULT_FILE_PATTERN};
use crate::utils::fs::glob_in;
use crate::utils::output;

/// Refreshes the workspace metadata document before any probe runs.
#[async_trait]
pub trait MetadataRefresher: Send + Sync {
    /// Returns the number of reports written.
    async fn refresh(&self) -> Result<usize, FabricError>;
}

/// Refresh against the BI REST API.
pub struct RestMetadataRefresher<'a> {
    settings: &'a Settings,
    client: Client,
}

impl<'a> RestMetadataRefresher<'a> {
    pub fn new(settings: &'a Settings, client: Client) -> Self {
        Self { settings, client }
    }
}

#[async_trait]
impl MetadataRefresher for RestMetadataRefresher<'_> {
    async fn refresh(&self) -> Result<usize, FabricError> {
        let principal = self.settings.service_principal()?;
        let workspace_id = self.settings.workspace_id()?;
        let token = get_access_token(&self.client, &self.settings.endpoints, &principal, &self.settings.retry).await?;
        let metadata = fetch_workspace_metadata(
            &self.client,
            &self.settings.endpoints,
            &token,
            workspace_id,
            &self.settings.retry,
        )
        .await?;
        write_metadata(&self.settings.metadata_dir, &metadata).await?;
        Ok(metadata.report_count)
    }
}

pub type DocumentOpener = Box<dyn Fn(&Path) -> std::io::Result<()> + Send + Sync>;

fn open_in_browser(path: &Path) -> std::io::Result<()> {
    let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    webbrowser::open(&path.to_string_lossy())
}

/// Drives one process through the session phases.
///
/// Only the coordinator refreshes metadata, aggregates, renders and opens the
/// document; a worker's session ends once its result file is flushed.
pub struct SessionController {
    settings: Settings,
    role: SessionRole,
    session_id: String,
    phase: SessionPhase,
    lock: Option<CoordinatorLock>,
    opener: DocumentOpener,
    started: Instant,
}

impl SessionController {
    pub fn new(settings: Settings, role: SessionRole, session_id: impl Into<String>) -> Self {
        Self {
            settings,
            role,
            session_id: session_id.into(),
            phase: SessionPhase::NotStarted,
            lock: None,
            opener: Box::new(open_in_browser),
            started: Instant::now(),
        }
    }

    /// Coordinator for a session whose scanning already happened, such as one whose
    /// original coordinator was killed before aggregating.
    pub async fn resume_for_aggregation(settings: Settings, session_id: impl Into<String>) -> Result<Self, FabricError> {
        let mut session = Self::new(settings, SessionRole::Coordinator, session_id);
        session.lock = Some(CoordinatorLock::acquire(&session.settings.results_dir, &session.session_id).await?);
        session.phase = SessionPhase::Scanning;
        Ok(session)
    }

    pub fn with_opener(mut self, opener: DocumentOpener) -> Self {
        self.opener = opener;
        self
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Coordinator: claim the results directory, clear leftovers, refresh metadata.
    /// A refresh failure aborts the session before any probe runs.
    pub async fn start(&mut self, refresher: &dyn MetadataRefresher) -> Result<(), FabricError> {
        if !self.role.is_coordinator() {
            return Ok(());
        }
        if self.phase != SessionPhase::NotStarted {
            return Err(FabricError::Session(format!("Session already started ({})", self.phase)));
        }

        let lock = CoordinatorLock::acquire(&self.settings.results_dir, &self.session_id).await?;
        purge_stale_outputs(&self.settings.results_dir).await?;
        self.lock = Some(lock);

        let count = refresher.refresh().await?;
        info!(session_id = %self.session_id, reports = count, "Workspace metadata refreshed");
        self.phase.advance(SessionPhase::MetadataRefreshed)
    }

    pub fn begin_scanning(&mut self) -> Result<(), FabricError> {
        self.phase.advance(SessionPhase::Scanning)
    }

    /// End the session. Runs at most once; the coordinator returns the aggregated report.
    pub async fn finish(&mut self) -> Result<Option<FinalReport>, FabricError> {
        if self.phase == SessionPhase::Done {
            return Err(FabricError::Session("Session already finished".into()));
        }
        if !self.role.is_coordinator() {
            self.phase.advance(SessionPhase::Done)?;
            return Ok(None);
        }

        self.phase.advance(SessionPhase::Aggregating)?;
        let report = aggregate(
            &self.settings.results_dir,
            self.settings.environment.as_str(),
            &self.settings.final_json_path(),
        )
        .await?;

        let html_path = self.settings.report_html_path();
        write_report(&report, &self.settings.results_dir, &html_path).await?;
        self.phase.advance(SessionPhase::Rendered)?;
        info!(path = %html_path.display(), "HTML report generated");

        if self.settings.ci {
            info!("CI detected, not opening the report");
        } else if let Err(e) = (self.opener)(&html_path) {
            warn!(path = %html_path.display(), error = %e, "Could not open the report");
        }

        self.phase.advance(SessionPhase::Done)?;
        if let Some(lock) = self.lock.take() {
            lock.release().await?;
        }

        output::session_summary(&report.summary, self.started.elapsed().as_secs_f64() * 1000.0);
        Ok(Some(report))
    }
}

/// Remove worker files and screenshots a killed session left behind.
pub async fn purge_stale_outputs(results_dir: &Path) -> Result<usize, FabricError> {
    let mut removed = 0;
    for pattern in [RESULT_FILE_PATTERN, "*.png"] {
        for path in glob::glob(&glob_in(results_dir, pattern))?.filter_map(Result::ok) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "Could not remove stale output"),
            }
        }
    }
    if removed > 0 {
        info!(removed, "Removed stale outputs from a previous session");
    }
    Ok(removed)
}
