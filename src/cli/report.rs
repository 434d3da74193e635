use tracing::info;

use crate::cli::commands::ReportArgs;
use crate::cli::{load_settings, Cli};
use crate::errors::FabricError;

pub async fn handle_report(cli: &Cli, args: ReportArgs) -> Result<(), FabricError> {
    let settings = load_settings(cli, cli.overrides()).await?;
    let path = if args.json { settings.final_json_path() } else { settings.report_html_path() };

    if !tokio::fs::try_exists(&path).await? {
        return Err(FabricError::Config(format!(
            "No report found at {}. Run `fabric-ci-test test` first.",
            path.display()
        )));
    }

    if args.json {
        let content = tokio::fs::read_to_string(&path).await?;
        println!("{}", content);
        return Ok(());
    }

    info!(path = %path.display(), "Opening report");
    let target = std::fs::canonicalize(&path).unwrap_or(path);
    webbrowser::open(&target.to_string_lossy())?;
    Ok(())
}
