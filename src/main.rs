use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hostr::cli::{Cli, Commands};
use hostr::HostrConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hostr=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = HostrConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Status { json } => {
            hostr::cli::status(&config, json).await?;
        }
        Commands::List { verbose, category } => {
            hostr::cli::list(&config, verbose, category).await?;
        }
        Commands::Info { model } => {
            hostr::cli::info(&config, model).await?;
        }
        Commands::Config { json } => {
            hostr::cli::config(&config, json).await?;
        }
    }

    Ok(())
}
