use reqwest::Client;
use tracing::{info, info_span, Instrument};

use crate::auth::{get_access_token, TokenClient};
use crate::cli::commands::WorkerArgs;
use crate::cli::{http_client, load_settings, Cli};
use crate::config::Settings;
use crate::errors::FabricError;
use crate::metadata::{filter_reports, load_reports};
use crate::models::ReportMetadata;
use crate::probe::ChromiumBrowser;
use crate::session::{run_worker, select_shard, SessionController, SessionRole, WorkerContext, WorkerId, WorkerSummary};

/// Entry point of a spawned worker process.
pub async fn handle_worker(cli: &Cli, args: WorkerArgs) -> Result<(), FabricError> {
    let settings = load_settings(cli, cli.overrides()).await?;
    let worker_id = WorkerId::parse(&args.worker_id)?;
    let span = info_span!("session", session_id = %args.session_id);
    run_worker_session(settings, worker_id, args).instrument(span).await
}

async fn run_worker_session(settings: Settings, worker_id: WorkerId, args: WorkerArgs) -> Result<(), FabricError> {
    let mut session = SessionController::new(
        settings.clone(),
        SessionRole::Worker(worker_id.clone()),
        args.session_id.clone(),
    );
    session.begin_scanning()?;

    let reports = filter_reports(load_reports(&settings.metadata_dir).await?, args.filter.as_deref())?;
    let shard = select_shard(reports, args.shard, args.shards);
    info!(worker_id = %worker_id, shard = args.shard, shards = args.shards, reports = shard.len(), "Worker shard assigned");

    let summary = execute_shard(&settings, http_client()?, worker_id, &shard).await?;
    session.finish().await?;

    match summary.unsuccessful() {
        0 => Ok(()),
        n => Err(FabricError::TestsFailed(n)),
    }
}

/// Authenticate, launch a browser and test `reports` one by one as `worker_id`.
pub async fn execute_shard(
    settings: &Settings,
    client: Client,
    worker_id: WorkerId,
    reports: &[ReportMetadata],
) -> Result<WorkerSummary, FabricError> {
    if reports.is_empty() {
        return Ok(WorkerSummary::default());
    }

    let principal = settings.service_principal()?;
    let access_token = get_access_token(&client, &settings.endpoints, &principal, &settings.retry).await?;
    let tokens = TokenClient::new(client, settings, access_token);
    let browser = ChromiumBrowser::launch(&settings.browser, &settings.probe).await?;

    let mut ctx = WorkerContext::new(settings, worker_id, &tokens, &browser);
    let summary = run_worker(&mut ctx, reports).await;

    browser.close().await?;
    Ok(summary)
}
