//! In-memory chain used for dry runs and tests

use std::collections::{HashMap, HashSet};

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::{Config, SimulationCfg};
use crate::domain::chain::{
    ChainInterface, Collateral, PoolBalance, PoolContext, PreparedTx, Receipt, Reward, TvlInfo,
    TxArg, TxSubmitter, NATIVE_ASSET,
};
use crate::math;
use crate::shared::errors::{AppError, ChainError};
use crate::shared::types::{PoolConfig, TxHash};

/// Failure points that can be armed with [`SimulatedChain::fail_next`]. Each one fires once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    Apr,
    Tvl,
    Estimate,
    Submit,
    Receipt,
    Revert,
}

/// Market side of one simulated pool
#[derive(Debug, Clone)]
pub struct SimulatedPool {
    pub config: PoolConfig,
    pub tvl: U256,
    pub apr: String,
    pub usd_ratio: String,
    pub coll_ratio: String,
    pub collaterals: Vec<Collateral>,
    pub reward: Reward,
    pub pool_balance: PoolBalance,
}

impl SimulatedPool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            reward: Reward {
                symbol: config.token_name.clone(),
                amount: "0".to_string(),
            },
            config,
            tvl: U256::ZERO,
            apr: "0".to_string(),
            usd_ratio: "1".to_string(),
            coll_ratio: "0".to_string(),
            collaterals: Vec::new(),
            pool_balance: PoolBalance::default(),
        }
    }
}

/// A transaction accepted by the simulated mempool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTx {
    pub hash: TxHash,
    pub tx: PreparedTx,
    pub from: Address,
    pub value: U256,
    pub gas: u64,
}

#[derive(Debug, Default)]
struct Ledger {
    pools: HashMap<Address, SimulatedPool>,
    wallets: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address), U256>,
    shares: HashMap<(Address, Address), U256>,
    faults: HashSet<Fault>,
    tvl_queries: HashMap<Address, usize>,
    sent: Vec<SentTx>,
    block_number: u64,
}

impl Ledger {
    fn take_fault(&mut self, fault: Fault) -> bool {
        self.faults.remove(&fault)
    }

    fn pool(&self, address: &Address, query: &'static str) -> Result<&SimulatedPool, ChainError> {
        self.pools.get(address).ok_or_else(|| ChainError::Query {
            query,
            cause: format!("unknown pool {}", address),
        })
    }

    /// Apply a mined transaction; returns false when the contract would revert
    fn execute(&mut self, sent: &SentTx) -> bool {
        match (sent.tx.method.as_str(), sent.tx.args.as_slice()) {
            ("approve", [TxArg::Address(spender), TxArg::Uint(allowance)]) => {
                self.allowances.insert((sent.from, *spender), *allowance);
                true
            }
            ("deposit", [TxArg::Uint(amount)]) => self.deposit(sent, *amount),
            ("withdraw", [TxArg::Uint(share)]) => self.withdraw(sent, *share),
            _ => false,
        }
    }

    fn deposit(&mut self, sent: &SentTx, amount: U256) -> bool {
        let Some(pool) = self.pools.get(&sent.tx.to) else {
            return false;
        };
        let pool_address = pool.config.pool_address;
        let token = pool.config.token_address;
        let native = token == NATIVE_ASSET;

        if native && sent.value != amount {
            return false;
        }
        if !native {
            let allowance = self.allowances.get(&(sent.from, pool_address)).copied().unwrap_or_default();
            if allowance < amount {
                return false;
            }
        }

        let wallet = self.wallets.entry((sent.from, token)).or_default();
        if *wallet < amount {
            return false;
        }
        *wallet -= amount;
        *self.shares.entry((sent.from, pool_address)).or_default() += amount;
        if let Some(pool) = self.pools.get_mut(&pool_address) {
            pool.tvl += amount;
        }
        true
    }

    fn withdraw(&mut self, sent: &SentTx, share: U256) -> bool {
        let Some(pool) = self.pools.get_mut(&sent.tx.to) else {
            return false;
        };

        // A zero-share withdrawal only pays out the reward
        if share.is_zero() {
            pool.reward.amount = "0".to_string();
            return true;
        }

        let pool_address = pool.config.pool_address;
        let token = pool.config.token_address;
        let held = self.shares.entry((sent.from, pool_address)).or_default();
        if *held < share {
            return false;
        }
        *held -= share;
        pool.tvl = pool.tvl.saturating_sub(share);
        *self.wallets.entry((sent.from, token)).or_default() += share;
        true
    }
}

/// In-memory [`ChainInterface`] and [`TxSubmitter`]. User shares are valued 1:1 in USD.
pub struct SimulatedChain {
    ledger: Mutex<Ledger>,
    pending: Mutex<HashMap<TxHash, SentTx>>,
    gas_estimate: u64,
}

impl Default for SimulatedChain {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedChain {
    pub fn new() -> Self {
        Self {
            ledger: Mutex::new(Ledger::default()),
            pending: Mutex::new(HashMap::new()),
            gas_estimate: 150_000,
        }
    }

    pub fn with_gas_estimate(mut self, gas_estimate: u64) -> Self {
        self.gas_estimate = gas_estimate;
        self
    }

    /// Seed a chain from the `[simulation]` section of the config file
    pub async fn from_config(config: &Config, chain_id: u64) -> Result<Self, AppError> {
        let pools = config.pools_for_chain(chain_id);
        let Some(simulation) = &config.simulation else {
            return Err(AppError::ConfigError("missing [simulation] section".to_string()));
        };

        let chain = Self::new().with_gas_estimate(simulation.gas_estimate);
        chain.seed(simulation, &pools).await?;
        Ok(chain)
    }

    async fn seed(&self, simulation: &SimulationCfg, pools: &[PoolConfig]) -> Result<(), AppError> {
        let user = simulation.user;
        let native = math::to_raw_amount(&simulation.native_balance, 18)?;
        self.set_wallet_balance(user, NATIVE_ASSET, native).await;

        // Configured pools without a seed start empty; seeds for other chains are skipped
        for config in pools {
            let decimals = config.decimals;
            let mut pool = SimulatedPool::new(config.clone());
            let Some(seed) = simulation.pools.iter().find(|seed| seed.pool_address == config.pool_address) else {
                self.add_pool(pool).await;
                continue;
            };

            pool.tvl = math::to_raw_amount(&seed.tvl, decimals)?;
            pool.apr = seed.apr.clone();
            pool.usd_ratio = seed.usd_ratio.clone();
            pool.coll_ratio = seed.coll_ratio.clone();
            pool.collaterals = seed.collaterals.clone();
            pool.reward.amount = seed.reward.clone();
            pool.pool_balance = PoolBalance {
                eth: math::to_raw_amount(&seed.pool_eth, 18)?,
                token: math::to_raw_amount(&seed.pool_token, decimals)?,
            };
            self.add_pool(pool).await;

            if config.token_address != NATIVE_ASSET {
                let balance = math::to_raw_amount(&seed.wallet_balance, decimals)?;
                self.set_wallet_balance(user, config.token_address, balance).await;
            }
            if seed.approved {
                self.set_allowance(user, config.pool_address, U256::MAX).await;
            }
            let share = math::to_raw_amount(&seed.share, decimals)?;
            self.set_share(user, config.pool_address, share).await;
        }
        debug!("simulated chain seeded with {} pools", pools.len());
        Ok(())
    }

    pub async fn add_pool(&self, pool: SimulatedPool) {
        let mut ledger = self.ledger.lock().await;
        ledger.pools.insert(pool.config.pool_address, pool);
    }

    pub async fn set_wallet_balance(&self, user: Address, token: Address, raw: U256) {
        self.ledger.lock().await.wallets.insert((user, token), raw);
    }

    pub async fn set_allowance(&self, user: Address, pool: Address, raw: U256) {
        self.ledger.lock().await.allowances.insert((user, pool), raw);
    }

    pub async fn set_share(&self, user: Address, pool: Address, raw: U256) {
        self.ledger.lock().await.shares.insert((user, pool), raw);
    }

    pub async fn set_reward(&self, pool: Address, amount: &str) {
        if let Some(pool) = self.ledger.lock().await.pools.get_mut(&pool) {
            pool.reward.amount = amount.to_string();
        }
    }

    /// Arm a one-shot failure
    pub async fn fail_next(&self, fault: Fault) {
        self.ledger.lock().await.faults.insert(fault);
    }

    /// How many times the pool's metrics have been queried
    pub async fn query_count(&self, pool: Address) -> usize {
        self.ledger.lock().await.tvl_queries.get(&pool).copied().unwrap_or_default()
    }

    pub async fn sent_transactions(&self) -> Vec<SentTx> {
        self.ledger.lock().await.sent.clone()
    }
}

#[async_trait]
impl ChainInterface for SimulatedChain {
    async fn get_apr(&self, ctx: &PoolContext) -> Result<String, ChainError> {
        let mut ledger = self.ledger.lock().await;
        if ledger.take_fault(Fault::Apr) {
            return Err(ChainError::Query { query: "apr", cause: "rate oracle unavailable".to_string() });
        }
        Ok(ledger.pool(&ctx.pool_address(), "apr")?.apr.clone())
    }

    async fn get_tvl(&self, ctx: &PoolContext) -> Result<TvlInfo, ChainError> {
        let mut ledger = self.ledger.lock().await;
        *ledger.tvl_queries.entry(ctx.pool_address()).or_default() += 1;
        if ledger.take_fault(Fault::Tvl) {
            return Err(ChainError::Query { query: "tvl", cause: "execution reverted".to_string() });
        }
        let pool = ledger.pool(&ctx.pool_address(), "tvl")?;
        Ok(TvlInfo {
            tvl: pool.tvl,
            usd_ratio: pool.usd_ratio.clone(),
            coll_ratio: pool.coll_ratio.clone(),
        })
    }

    async fn get_wallet_balance(&self, ctx: &PoolContext) -> Result<U256, ChainError> {
        let ledger = self.ledger.lock().await;
        Ok(ledger.wallets.get(&(ctx.user, ctx.token_address())).copied().unwrap_or_default())
    }

    async fn get_pool_balance(&self, ctx: &PoolContext) -> Result<PoolBalance, ChainError> {
        let ledger = self.ledger.lock().await;
        Ok(ledger.pool(&ctx.pool_address(), "pool balance")?.pool_balance.clone())
    }

    async fn get_allowance(&self, ctx: &PoolContext) -> Result<U256, ChainError> {
        // Native deposits need no approval
        if self.is_eth(&ctx.token_address()) {
            return Ok(U256::MAX);
        }
        let ledger = self.ledger.lock().await;
        Ok(ledger.allowances.get(&(ctx.user, ctx.pool_address())).copied().unwrap_or_default())
    }

    async fn get_user_share_in_usd(&self, ctx: &PoolContext) -> Result<U256, ChainError> {
        let ledger = self.ledger.lock().await;
        Ok(ledger.shares.get(&(ctx.user, ctx.pool_address())).copied().unwrap_or_default())
    }

    async fn get_collaterals(&self, ctx: &PoolContext) -> Result<Vec<Collateral>, ChainError> {
        let ledger = self.ledger.lock().await;
        Ok(ledger.pool(&ctx.pool_address(), "collaterals")?.collaterals.clone())
    }

    async fn get_reward(&self, ctx: &PoolContext) -> Result<Reward, ChainError> {
        let ledger = self.ledger.lock().await;
        Ok(ledger.pool(&ctx.pool_address(), "reward")?.reward.clone())
    }

    async fn usd_to_share(&self, ctx: &PoolContext, usd_amount: &str) -> Result<U256, ChainError> {
        self.denormalize(usd_amount, ctx.pool.decimals).map_err(|e| ChainError::Query {
            query: "usd to share",
            cause: e.to_string(),
        })
    }

    fn grant_allowance(&self, ctx: &PoolContext) -> PreparedTx {
        PreparedTx::new(
            ctx.token_address(),
            "approve",
            vec![TxArg::Address(ctx.pool_address()), TxArg::Uint(U256::MAX)],
        )
    }

    fn deposit(&self, ctx: &PoolContext, amount: U256) -> PreparedTx {
        PreparedTx::new(ctx.pool_address(), "deposit", vec![TxArg::Uint(amount)])
    }

    fn withdraw(&self, ctx: &PoolContext, share: U256) -> PreparedTx {
        PreparedTx::new(ctx.pool_address(), "withdraw", vec![TxArg::Uint(share)])
    }
}

#[async_trait]
impl TxSubmitter for SimulatedChain {
    async fn estimate_gas(&self, _tx: &PreparedTx, _from: Address, _value: U256) -> Result<u64, ChainError> {
        if self.ledger.lock().await.take_fault(Fault::Estimate) {
            return Err(ChainError::Estimation("execution reverted during estimation".to_string()));
        }
        Ok(self.gas_estimate)
    }

    async fn send_transaction(
        &self,
        tx: &PreparedTx,
        from: Address,
        value: U256,
        gas: u64,
    ) -> Result<TxHash, ChainError> {
        let mut ledger = self.ledger.lock().await;
        if ledger.take_fault(Fault::Submit) {
            return Err(ChainError::Submission("user rejected the request".to_string()));
        }

        let hash = B256::from(rand::random::<[u8; 32]>());
        let sent = SentTx { hash, tx: tx.clone(), from, value, gas };
        ledger.sent.push(sent.clone());
        self.pending.lock().await.insert(hash, sent);
        debug!("simulated mempool accepted {}", hash);
        Ok(hash)
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<Receipt, ChainError> {
        let sent = self
            .pending
            .lock()
            .await
            .remove(&hash)
            .ok_or_else(|| ChainError::Receipt(format!("unknown transaction {}", hash)))?;

        let mut ledger = self.ledger.lock().await;
        if ledger.take_fault(Fault::Receipt) {
            return Err(ChainError::Receipt("connection dropped while waiting".to_string()));
        }
        let success = !ledger.take_fault(Fault::Revert) && ledger.execute(&sent);
        ledger.block_number += 1;

        Ok(Receipt {
            hash,
            block_number: ledger.block_number,
            gas_used: self.gas_estimate.min(sent.gas),
            success,
            mined_at: Utc::now(),
        })
    }
}
