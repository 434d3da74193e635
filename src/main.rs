use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use fabric_ci_test::cli::{self, Cli, Commands};
use fabric_ci_test::version_line;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(!cli.no_color)
            .init();
    }
    if cli.no_color {
        console::set_colors_enabled(false);
    }
    debug!(version = %version_line(), "fabric-ci-test starting");

    let result = match cli.command {
        Commands::Init(ref args) => cli::init::handle_init(args.clone()).await,
        Commands::Fetch => cli::fetch::handle_fetch(&cli).await,
        Commands::Preflight => cli::preflight::handle_preflight(&cli).await,
        Commands::Test(ref args) => cli::test::handle_test(&cli, args.clone()).await,
        Commands::Worker(ref args) => cli::worker::handle_worker(&cli, args.clone()).await,
        Commands::Aggregate => cli::aggregate::handle_aggregate(&cli).await,
        Commands::Report(ref args) => cli::report::handle_report(&cli, args.clone()).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
