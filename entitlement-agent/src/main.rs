//! Entitlement agent
//!
//! Manages the license of one package from the command line:
//!   entitlement-agent --config acme.json activate KEY-123
//!   entitlement-agent --config acme.json status
//!   entitlement-agent --config acme.json run
//!
//! `run` stays in the foreground and re-validates the license twice daily.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use entitlement_agent::Agent;
use entitlement_service::{Operation, SdkConfig};
use entitlement_storage::SqliteStore;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "entitlement-agent")]
#[command(about = "Manage and validate a software license entitlement")]
struct Args {
    /// Path to the package config (JSON)
    #[arg(short, long, default_value = "entitlement.json")]
    config: PathBuf,

    /// Path to the license database
    #[arg(short, long, default_value = "entitlement.db")]
    db: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the stored license as JSON
    Status,
    /// Register and activate a license key for this site
    Activate { key: String },
    /// Release this site's activation
    Deactivate,
    /// Check the activation against the entitlement service; revokes on failure
    Validate,
    /// Re-fetch license details, keeping the local status
    Refresh,
    /// Stay in the foreground and run scheduled validations
    Run {
        /// Seconds between checks for due validations
        #[arg(long, default_value = "60")]
        interval_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_level.as_str())),
        )
        .with_target(false)
        .compact()
        .init();

    let config = SdkConfig::load(&args.config)
        .with_context(|| format!("failed to load config from {:?}", args.config))?;
    let store = SqliteStore::open(&args.db)
        .with_context(|| format!("failed to open license database {:?}", args.db))?;
    let agent = Agent::new(config, store)?;

    let operation = match args.command {
        Command::Status => {
            println!("{}", serde_json::to_string_pretty(&agent.status()?)?);
            return Ok(());
        }
        Command::Run { interval_secs } => {
            info!("entitlement agent running (checking every {}s)", interval_secs);
            let shutdown = async {
                let _ = tokio::signal::ctrl_c().await;
            };
            return agent
                .run(Duration::from_secs(interval_secs.max(1)), shutdown)
                .await;
        }
        Command::Activate { key } => {
            let notice = agent.execute(Operation::Activate, Some(&key)).await?;
            return report(&notice);
        }
        Command::Deactivate => Operation::Deactivate,
        Command::Validate => Operation::Validate,
        Command::Refresh => Operation::Refresh,
    };

    let notice = agent.execute(operation, None).await?;
    report(&notice)
}

fn report(notice: &entitlement_service::Notice) -> Result<()> {
    println!("{}", notice.message);
    if notice.is_error() {
        anyhow::bail!("{}", notice.id);
    }
    Ok(())
}
