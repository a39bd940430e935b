//! Helpdesk MCP server binary
//!
//! Serves the ticket engine tools over stdio. Logs go to stderr so they never
//! interleave with protocol frames on stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use helpdesk::{Desk, DeskConfig, DeskServer};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// RocksDB state directory (overrides HELPDESK_STATE_PATH)
    #[arg(long)]
    state_path: Option<PathBuf>,

    /// Classifier endpoint (overrides HELPDESK_CLASSIFIER_URL)
    #[arg(long)]
    classifier_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("helpdesk=info,ticketing=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting helpdesk MCP server");

    let mut config =
        DeskConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    config.apply_overrides(args.state_path, args.classifier_url);

    tracing::info!(
        "Config: teams={}, categories={}, classify_timeout={}s, restrict_to_owning_team={}",
        config.teams.len(),
        config.categories.labels().len(),
        config.intake.classify_timeout_secs,
        config.assignment.restrict_to_owning_team
    );

    let desk = Desk::open(&config)?;
    let server = DeskServer::new(desk);

    let transport = (stdin(), stdout());
    let service = server.serve(transport).await?;

    service.waiting().await?;

    Ok(())
}
