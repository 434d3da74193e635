use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{SettingsOverrides, WorkerCount};

#[derive(Parser)]
#[command(name = "fabric-ci-test", version, about = "Visual regression testing for Power BI reports")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// YAML configuration file (default: ./fabric-ci.yaml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// BI cloud: prod or gov
    #[arg(short, long, global = true)]
    pub environment: Option<String>,

    /// Directory for worker results, screenshots and the final report
    #[arg(long, global = true)]
    pub results_dir: Option<PathBuf>,
}

impl Cli {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            environment: self.environment.clone(),
            workers: None,
            results_dir: self.results_dir.clone(),
        }
    }

    /// Global flags a spawned worker needs to resolve the same settings and log the same way.
    pub fn passthrough_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(config) = &self.config {
            args.push("--config".to_string());
            args.push(config.display().to_string());
        }
        if let Some(env) = &self.environment {
            args.push("--environment".to_string());
            args.push(env.clone());
        }
        if let Some(dir) = &self.results_dir {
            args.push("--results-dir".to_string());
            args.push(dir.display().to_string());
        }
        if self.verbose > 0 {
            args.push(format!("-{}", "v".repeat(self.verbose as usize)));
        }
        if self.quiet {
            args.push("--quiet".to_string());
        }
        if self.no_color {
            args.push("--no-color".to_string());
        }
        if self.json_logs {
            args.push("--json-logs".to_string());
        }
        args
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter fabric-ci.yaml
    Init(InitArgs),
    /// Refresh workspace report metadata and exit
    Fetch,
    /// Check credentials, metadata and token access before a run
    Preflight,
    /// Run a full test session: refresh, scan, aggregate, render
    Test(TestArgs),
    /// Run one shard of a session (spawned by `test`)
    #[command(hide = true)]
    Worker(WorkerArgs),
    /// Aggregate leftover worker results and render the report
    Aggregate,
    /// Open the last rendered report
    Report(ReportArgs),
}

#[derive(Args, Clone)]
pub struct InitArgs {
    /// Where to write the file
    #[arg(default_value = "fabric-ci.yaml")]
    pub path: PathBuf,
}

#[derive(Args, Clone)]
pub struct TestArgs {
    /// Parallel worker processes: a number or `auto`
    #[arg(short = 'n', long)]
    pub workers: Option<WorkerCount>,

    /// Only test reports whose `Name (Id)` matches this regex
    #[arg(short = 'k', long)]
    pub filter: Option<String>,
}

#[derive(Args, Clone)]
pub struct WorkerArgs {
    #[arg(long)]
    pub worker_id: String,

    #[arg(long)]
    pub shard: usize,

    #[arg(long)]
    pub shards: usize,

    #[arg(long)]
    pub session_id: String,

    #[arg(long)]
    pub filter: Option<String>,
}

#[derive(Args, Clone)]
pub struct ReportArgs {
    /// Print the aggregated JSON instead of opening the HTML report
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_test_command() {
        let cli = Cli::parse_from(["fabric-ci-test", "-vv", "test", "-n", "4", "-k", "Sales", "--environment", "gov"]);
        assert_eq!(cli.verbose, 2);
        match &cli.command {
            Commands::Test(args) => {
                assert_eq!(args.workers, Some(WorkerCount::Fixed(4)));
                assert_eq!(args.filter.as_deref(), Some("Sales"));
            }
            _ => panic!("expected test command"),
        }
        assert_eq!(cli.passthrough_args(), vec!["--environment", "gov", "-vv"]);
    }

    #[test]
    fn test_worker_accepts_forwarded_globals() {
        let cli = Cli::parse_from([
            "fabric-ci-test", "worker", "--worker-id", "gw1", "--shard", "1", "--shards", "2",
            "--session-id", "s", "--environment", "gov", "-v", "--json-logs",
        ]);
        assert_eq!(cli.environment.as_deref(), Some("gov"));
        assert!(cli.json_logs);
        assert!(matches!(cli.command, Commands::Worker(ref w) if w.shard == 1 && w.shards == 2));
    }

    #[test]
    fn test_invalid_worker_count_rejected() {
        assert!(Cli::try_parse_from(["fabric-ci-test", "test", "--workers", "many"]).is_err());
    }
}
