use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::cli::commands::TestArgs;
use crate::cli::worker::execute_shard;
use crate::cli::{http_client, load_settings, Cli};
use crate::config::Settings;
use crate::errors::FabricError;
use crate::metadata::{filter_reports, load_reports};
use crate::session::{
    spawn_workers, RestMetadataRefresher, SessionController, SessionRole, WorkerId, WorkerInvocation,
};

/// Coordinating session: refresh, scan in parallel workers, aggregate, render.
pub async fn handle_test(cli: &Cli, args: TestArgs) -> Result<(), FabricError> {
    let mut overrides = cli.overrides();
    overrides.workers = args.workers;
    let settings = load_settings(cli, overrides).await?;
    settings.require_complete()?;

    let session_id = Uuid::new_v4().to_string();
    let span = info_span!("session", session_id = %session_id);
    run_session(cli, args, settings, session_id).instrument(span).await
}

async fn run_session(cli: &Cli, args: TestArgs, settings: Settings, session_id: String) -> Result<(), FabricError> {
    let client = http_client()?;
    let mut session = SessionController::new(settings.clone(), SessionRole::Coordinator, session_id.clone());
    session.start(&RestMetadataRefresher::new(&settings, client.clone())).await?;

    let reports = filter_reports(load_reports(&settings.metadata_dir).await?, args.filter.as_deref())?;
    if reports.is_empty() {
        return Err(FabricError::Config(format!(
            "No reports found in {}",
            settings.metadata_dir.display()
        )));
    }

    let workers = settings.workers.resolve(reports.len());
    info!(reports = reports.len(), workers, "Starting scan");
    session.begin_scanning()?;

    let unsuccessful = if workers <= 1 {
        match execute_shard(&settings, client, WorkerId::master(), &reports).await {
            Ok(summary) => summary.unsuccessful(),
            Err(e) => {
                error!(error = %settings.redact(&e.to_string()), "In-process worker failed");
                reports.len()
            }
        }
    } else {
        let exe = std::env::current_exe()?;
        let invocations = (0..workers)
            .map(|shard| WorkerInvocation {
                worker_id: WorkerId::for_shard(shard),
                shard,
                shards: workers,
                session_id: session_id.clone(),
                filter: args.filter.clone(),
                passthrough: cli.passthrough_args(),
            })
            .collect();
        let statuses = spawn_workers(&exe, invocations).await?;
        for (id, status) in statuses.iter().filter(|(_, s)| !s.is_success()) {
            warn!(worker_id = %id, status = ?status, "Worker reported failures");
        }
        statuses.iter().filter(|(_, s)| !s.is_success()).count()
    };

    let report = session.finish().await?;
    let failed_reports = report
        .map(|r| r.reports.iter().filter(|rep| !rep.passed()).count())
        .unwrap_or(0);

    match failed_reports.max(unsuccessful) {
        0 => Ok(()),
        n => Err(FabricError::TestsFailed(n)),
    }
}
