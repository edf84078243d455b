mod app;
mod report;

use alloy_primitives::Address;
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use poolstore::config::Config;

#[derive(Parser, Debug)]
#[command(version, about = "Stability pool client: inspect pools, deposit, withdraw and claim rewards")]
struct Args {
    /// Path to config file
    #[arg(long, default_value = "Config.toml")]
    config: String,

    /// Chain id to connect to (overrides config)
    #[arg(long)]
    chain: Option<u64>,

    /// Wallet address to connect (overrides config)
    #[arg(long)]
    user: Option<Address>,

    /// Wait after a settled transaction before refreshing, in milliseconds (overrides config)
    #[arg(long)]
    grace_period_ms: Option<u64>,

    /// Print pool state as JSON
    #[arg(long)]
    json: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<app::Command>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_file(&args.config)?;

    // Priority: CLI args > Config file > Defaults
    let mut app_cfg = app::AppCfg::from_config(config, args.command.unwrap_or_default())?;
    if let Some(chain) = args.chain {
        app_cfg.chain_id = chain;
    }
    if let Some(user) = args.user {
        app_cfg.user = user;
    }
    if let Some(grace_period_ms) = args.grace_period_ms {
        app_cfg.settings.grace_period = std::time::Duration::from_millis(grace_period_ms);
    }
    app_cfg.json = args.json;

    app::run(app_cfg).await
}
