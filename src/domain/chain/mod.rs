//! Chain domain - what the stores need from web3

mod chain_interface;

pub use chain_interface::{ChainInterface, TxSubmitter, NATIVE_ASSET};

use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::types::{ChainId, PoolConfig, Session, TxHash};

/// Everything a chain call needs to know about the caller and the pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolContext {
    pub user: Address,
    pub chain: ChainId,
    pub pool: PoolConfig,
}

impl PoolContext {
    pub fn new(session: &Session, pool: &PoolConfig) -> Self {
        Self {
            user: session.user,
            chain: session.chain,
            pool: pool.clone(),
        }
    }

    pub fn pool_address(&self) -> Address {
        self.pool.pool_address
    }

    pub fn token_address(&self) -> Address {
        self.pool.token_address
    }
}

/// Result of the tvl query; the ratios split a share into its USD and collateral parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TvlInfo {
    pub tvl: U256,
    pub usd_ratio: String,
    pub coll_ratio: String,
}

/// Raw balances held by the pool contract
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolBalance {
    pub eth: U256,
    pub token: U256,
}

/// One collateral asset backing the pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collateral {
    pub symbol: String,
    pub address: Address,
    pub amount: String,
}

/// Claimable reward for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub symbol: String,
    pub amount: String,
}

/// A contract call argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxArg {
    Address(Address),
    Uint(U256),
    Text(String),
    Bytes(Vec<u8>),
}

impl TxArg {
    /// Unset arguments are empty text/bytes or the zero address. A zero integer is a real value.
    pub fn is_unset(&self) -> bool {
        match self {
            TxArg::Address(address) => address.is_zero(),
            TxArg::Uint(_) => false,
            TxArg::Text(text) => text.is_empty(),
            TxArg::Bytes(bytes) => bytes.is_empty(),
        }
    }
}

/// A built, not yet submitted contract call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTx {
    pub to: Address,
    pub method: String,
    pub args: Vec<TxArg>,
}

impl PreparedTx {
    pub fn new(to: Address, method: impl Into<String>, args: Vec<TxArg>) -> Self {
        Self {
            to,
            method: method.into(),
            args,
        }
    }
}

/// Confirmation record of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub hash: TxHash,
    pub block_number: u64,
    pub gas_used: u64,
    pub success: bool,
    pub mined_at: DateTime<Utc>,
}
