//! crm-auth - drives the CRM dashboard auth adapter from the command line.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use crm_auth_adapter::SharedLocation;
use crm_auth_cli::{build_provider, commands, Command, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "crm-auth")]
#[command(about = "Sign in to the CRM dashboard backend and run its auth checks")]
#[command(version)]
struct Cli {
    /// Path to configuration file (default: crm-auth.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_deref()).map_err(|e| {
        format!(
            "Failed to load configuration: {}. \
             Make sure crm-auth.toml exists or set CRM_AUTH__SUPABASE__URL and CRM_AUTH__SUPABASE__ANON_KEY.",
            e
        )
    })?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!(
        supabase_url = %config.supabase.url,
        storage = %config.storage.path.display(),
        "Loaded configuration"
    );

    let location = Arc::new(SharedLocation::default());
    let provider = build_provider(&config, location.clone());

    let outcome = commands::run(&provider, &location, cli.command).await?;
    Ok(outcome.report())
}
