use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "sweep", version, about = "Policy-driven data retention batch runner")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a retention run against the configured database.
    ///
    /// Exit code 0 when the run commits, 1 when it rolls back; designed to
    /// be invoked from cron or a job scheduler.
    Run {
        /// Path to the configuration file.
        #[arg(long, default_value = "sweep.yaml")]
        config: PathBuf,

        /// Decide and report, but roll back instead of committing.
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Print the final report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List the policy catalog entries enabled by the configuration.
    Policies {
        /// Path to the configuration file.
        #[arg(long, default_value = "sweep.yaml")]
        config: PathBuf,
    },

    /// Validate the configuration and show the resolved delays per policy.
    Check {
        /// Path to the configuration file.
        #[arg(long, default_value = "sweep.yaml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run {
            config,
            dry_run,
            json,
        } => commands::run::execute(&config, dry_run, json).await,
        Command::Policies { config } => commands::policies::execute(&config),
        Command::Check { config } => commands::check::execute(&config),
    }
}
