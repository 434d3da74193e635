use console::style;
use tracing::info;

use crate::cli::{http_client, load_settings, Cli};
use crate::errors::FabricError;
use crate::session::{MetadataRefresher, RestMetadataRefresher};

pub async fn handle_fetch(cli: &Cli) -> Result<(), FabricError> {
    let settings = load_settings(cli, cli.overrides()).await?;
    settings.require_complete()?;

    info!(environment = %settings.environment, "Fetching workspace metadata");
    let refresher = RestMetadataRefresher::new(&settings, http_client()?);
    let count = refresher.refresh().await?;

    println!(
        "{} Exported {} reports to {}",
        style("SUCCESS:").green().bold(),
        count,
        settings.metadata_output_path().display()
    );
    Ok(())
}
