use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::cli::commands::InitArgs;
use crate::errors::FabricError;

pub const CONFIG_TEMPLATE: &str = r#"# fabric-ci-test configuration.
# Values written as $NAME are read from the environment at startup.

environment: prod            # prod | gov

credentials:
  client_id: $SP_CLIENT_ID
  client_secret: $SP_CLIENT_SECRET
  tenant_id: $SP_TENANT_ID

workspace_id: $WORKSPACE_ID

rls:
  default_role: $DEFAULT_RLS_ROLE
  username: TestUser

paths:
  results_dir: tests/test-results
  metadata_dir: metadata/reports

probe:
  poll_interval_ms: 1000
  render_timeout_ms: 15000
  screenshot_settle_ms: 800

workers: auto
retries: 3
"#;

pub async fn handle_init(args: InitArgs) -> Result<(), FabricError> {
    let mut file = match tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&args.path)
        .await
    {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(FabricError::Config(format!(
                "{} already exists, not overwriting",
                args.path.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };
    file.write_all(CONFIG_TEMPLATE.as_bytes()).await?;
    file.flush().await?;

    info!(path = %args.path.display(), "Wrote configuration template");
    println!("Created {}. Export SP_CLIENT_ID, SP_CLIENT_SECRET, SP_TENANT_ID and WORKSPACE_ID, then run `fabric-ci-test fetch`.", args.path.display());
    Ok(())
}
