//! Chain capability traits

use alloy_primitives::{address, Address, U256};
use async_trait::async_trait;

use crate::math;
use crate::shared::errors::{AmountError, ChainError};
use crate::shared::types::TxHash;
use super::{Collateral, PoolBalance, PoolContext, PreparedTx, Receipt, Reward, TvlInfo};

/// Placeholder token address standing for the chain's native asset
pub const NATIVE_ASSET: Address = address!("EeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// Pool queries and transaction builders
#[async_trait]
pub trait ChainInterface: Send + Sync {
    async fn get_apr(&self, ctx: &PoolContext) -> Result<String, ChainError>;

    async fn get_tvl(&self, ctx: &PoolContext) -> Result<TvlInfo, ChainError>;

    async fn get_wallet_balance(&self, ctx: &PoolContext) -> Result<U256, ChainError>;

    async fn get_pool_balance(&self, ctx: &PoolContext) -> Result<PoolBalance, ChainError>;

    async fn get_allowance(&self, ctx: &PoolContext) -> Result<U256, ChainError>;

    async fn get_user_share_in_usd(&self, ctx: &PoolContext) -> Result<U256, ChainError>;

    async fn get_collaterals(&self, ctx: &PoolContext) -> Result<Vec<Collateral>, ChainError>;

    async fn get_reward(&self, ctx: &PoolContext) -> Result<Reward, ChainError>;

    /// Convert a human USD amount into raw pool shares
    async fn usd_to_share(&self, ctx: &PoolContext, usd_amount: &str) -> Result<U256, ChainError>;

    fn grant_allowance(&self, ctx: &PoolContext) -> PreparedTx;

    fn deposit(&self, ctx: &PoolContext, amount: U256) -> PreparedTx;

    fn withdraw(&self, ctx: &PoolContext, share: U256) -> PreparedTx;

    fn normalize(&self, raw: U256, decimals: u8) -> String {
        math::format_units(raw, decimals)
    }

    fn denormalize(&self, human: &str, decimals: u8) -> Result<U256, AmountError> {
        math::to_raw_amount(human, decimals)
    }

    fn is_eth(&self, token: &Address) -> bool {
        *token == NATIVE_ASSET
    }
}

/// Wallet side of web3: gas estimation, submission and receipts
#[async_trait]
pub trait TxSubmitter: Send + Sync {
    async fn estimate_gas(&self, tx: &PreparedTx, from: Address, value: U256) -> Result<u64, ChainError>;

    /// Resolves once the transaction is accepted into the mempool
    async fn send_transaction(
        &self,
        tx: &PreparedTx,
        from: Address,
        value: U256,
        gas: u64,
    ) -> Result<TxHash, ChainError>;

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<Receipt, ChainError>;
}
