use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wharf_keeper::config::{create_example_config, KeeperConfig};
use wharf_keeper::Keeper;

#[derive(Parser, Debug)]
#[command(name = "wharf-keeper")]
#[command(about = "Wharf off-chain receipt valuation service")]
struct Args {
    /// Path to keeper configuration file
    #[arg(short, long, default_value = "keeper.toml")]
    config: String,

    /// Run a single sweep and exit
    #[arg(long)]
    once: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Write an example configuration file to this path and exit
    #[arg(long)]
    example_config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    if let Some(path) = args.example_config {
        create_example_config(&path)
            .with_context(|| format!("failed to write example config to {path}"))?;
        tracing::info!(%path, "example configuration written");
        return Ok(());
    }

    let config = KeeperConfig::load(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config))?;
    tracing::info!(
        pools = config.pools.len(),
        snapshot = %config.snapshot_path,
        interval_secs = config.interval_secs,
        "starting wharf keeper"
    );

    Keeper::new(config)
        .run(args.once)
        .await
        .context("keeper run failed")
}
