// src/app.rs
use std::sync::Arc;

use alloy_primitives::Address;
use anyhow::{anyhow, Result};
use clap::Subcommand;
use tracing::{info, warn};

use poolstore::config::Config;
use poolstore::domain::pool::{FlowOutcome, PoolCollectionStore, PoolStore, StoreSettings};
use poolstore::domain::session::UserStore;
use poolstore::infrastructure::{PoolRegistry, SimulatedChain};
use poolstore::shared::errors::AppError;
use poolstore::shared::types::{ChainId, PoolAction};

use crate::report::PoolReport;

#[derive(Subcommand, Debug, Clone, Default)]
pub enum Command {
    /// Show every pool of the chain
    #[default]
    Status,
    /// Grant the pool an unlimited token allowance
    Approve { pool: String },
    /// Deposit a human amount of the pool token
    Deposit { pool: String, amount: String },
    /// Withdraw a USD amount from the pool
    Withdraw { pool: String, amount: String },
    /// Claim the pending reward
    Claim { pool: String },
}

#[derive(Debug, Clone)]
pub struct AppCfg {
    pub config: Config,
    pub chain_id: ChainId,
    pub user: Address,
    pub settings: StoreSettings,
    pub json: bool,
    pub command: Command,
}

impl AppCfg {
    pub fn from_config(cfg: Config, command: Command) -> Result<Self> {
        let chain_id = cfg
            .default_chain()
            .ok_or_else(|| AppError::ConfigError("no [[chains]] configured".to_string()))?;
        let user = cfg
            .simulation
            .as_ref()
            .map(|simulation| simulation.user)
            .ok_or_else(|| AppError::ConfigError("missing [simulation] user".to_string()))?;

        Ok(Self {
            settings: cfg.store_settings(),
            config: cfg,
            chain_id,
            user,
            json: false,
            command,
        })
    }
}

pub async fn run(app_cfg: AppCfg) -> Result<()> {
    info!("Starting poolstore on chain {} for {}", app_cfg.chain_id, app_cfg.user);

    let chain = Arc::new(SimulatedChain::from_config(&app_cfg.config, app_cfg.chain_id).await?);
    let user_store = Arc::new(UserStore::with_backend(chain));
    user_store.connect(app_cfg.user, app_cfg.chain_id);

    let registry = Arc::new(PoolRegistry::from_config(&app_cfg.config));
    let collection = PoolCollectionStore::new(Arc::clone(&user_store), registry, app_cfg.settings);
    if collection.on_user_connect().await == 0 {
        warn!("⚠️ No pools configured for chain {}", app_cfg.chain_id);
    }

    let outcome = match &app_cfg.command {
        Command::Status => None,
        command => Some(execute(&collection, command).await?),
    };

    let report = PoolReport::collect(&user_store.session(), &collection, outcome.as_ref()).await;
    if app_cfg.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print();
    }
    Ok(())
}

async fn execute(collection: &PoolCollectionStore, command: &Command) -> Result<FlowOutcome> {
    let outcome = match command {
        Command::Status => return Err(anyhow!("status runs no transaction")),
        Command::Approve { pool } => find_pool(collection, pool).await?.grant_allowance().await,
        Command::Deposit { pool, amount } => {
            let store = find_pool(collection, pool).await?;
            enter_amount(&store, PoolAction::Deposit, amount)?;
            store.deposit(amount).await
        }
        Command::Withdraw { pool, amount } => {
            let store = find_pool(collection, pool).await?;
            enter_amount(&store, PoolAction::Withdraw, amount)?;
            store.withdraw(amount).await
        }
        Command::Claim { pool } => find_pool(collection, pool).await?.claim_reward().await,
    };
    Ok(outcome)
}

/// Same steps as the action footer: pick the action, then type the amount
fn enter_amount(store: &PoolStore, action: PoolAction, amount: &str) -> Result<()> {
    store.open_footer(action);
    if store.on_input_change(amount) {
        return Ok(());
    }
    Err(anyhow!("{}", store.snapshot().input_err_msg))
}

/// Look a pool up by address or token name
async fn find_pool(collection: &PoolCollectionStore, key: &str) -> Result<Arc<PoolStore>, AppError> {
    if let Ok(address) = key.parse::<Address>() {
        if let Some(store) = collection.pool(address).await {
            return Ok(store);
        }
    }
    collection
        .stability_pools()
        .await
        .into_iter()
        .find(|store| store.config().token_name.eq_ignore_ascii_case(key))
        .ok_or_else(|| AppError::PoolNotFound(key.to_string()))
}
