// src/report.rs
use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::Serialize;

use poolstore::domain::pool::{FlowOutcome, PoolCollectionStore, PoolState};
use poolstore::shared::types::{ChainId, PoolFamily, Session};
use poolstore::shared::utils::format_address;

#[derive(Debug, Serialize)]
pub struct PoolReport {
    pub chain: ChainId,
    pub user: Address,
    pub outcome: Option<String>,
    pub pools: Vec<PoolSummary>,
    pub timestamp: DateTime<Utc>,
}

/// Pool state plus the values the UI derives from it
#[derive(Debug, Serialize)]
pub struct PoolSummary {
    pub family: PoolFamily,
    pub has_allowance: bool,
    pub collateral_percent: String,
    pub usd_percent: String,
    #[serde(flatten)]
    pub state: PoolState,
}

impl PoolReport {
    pub async fn collect(session: &Session, collection: &PoolCollectionStore, outcome: Option<&FlowOutcome>) -> Self {
        let pools = collection
            .stability_pools()
            .await
            .iter()
            .map(|store| {
                let state = store.snapshot();
                PoolSummary {
                    family: store.config().family,
                    has_allowance: state.has_allowance(),
                    collateral_percent: state.collateral_percent(),
                    usd_percent: state.usd_percent(),
                    state,
                }
            })
            .collect();

        Self {
            chain: session.chain,
            user: session.user,
            outcome: outcome.map(describe),
            pools,
            timestamp: Utc::now(),
        }
    }

    pub fn print(&self) {
        println!("Chain {} / {}", self.chain, format_address(&self.user));
        if let Some(outcome) = &self.outcome {
            println!("Last action: {}", outcome);
        }
        for pool in &self.pools {
            let state = &pool.state;
            println!();
            println!("{} [{}] {}", state.asset, pool.family.as_str(), format_address(&state.pool_address));
            println!("   - TVL: {}", state.tvl);
            println!("   - APR: {}", state.apr.as_deref().unwrap_or("n/a"));
            println!("   - Wallet: {}", state.wallet_balance);
            println!("   - Deposited (USD): {}", state.user_share_in_usd);
            println!("   - Split: {}% USD / {}% collateral", pool.usd_percent, pool.collateral_percent);
            if let Some(reward) = &state.reward {
                println!("   - Reward: {} {}", reward.amount, reward.symbol);
            }
            if let Some(balance) = &state.pool_balance {
                println!("   - Pool balance: {} ETH / {} {}", balance.eth, balance.token, state.asset);
            }
            for collateral in &state.collaterals {
                println!("   - Collateral: {} {}", collateral.amount, collateral.symbol);
            }
            println!("   - Unlocked: {}", if pool.has_allowance { "yes" } else { "no" });
        }
    }
}

fn describe(outcome: &FlowOutcome) -> String {
    match outcome {
        FlowOutcome::Confirmed(receipt) => {
            format!("confirmed {} in block {}", receipt.hash, receipt.block_number)
        }
        FlowOutcome::Failed(err) => format!("failed: {}", err),
        FlowOutcome::Refused(refusal) => format!("refused: {}", refusal),
    }
}
