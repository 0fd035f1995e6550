//! plasmidminer - model training entry point

use clap::Parser;
use plasmidminer::cli::{cmd_train, Cli};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plasmidminer=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.to_config()?;
    cmd_train(config)?;

    Ok(())
}
