//! Common types used across the application

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction hash
pub type TxHash = B256;

/// EVM chain id
pub type ChainId = u64;

/// Pool contract family. The two families differ in which extra metrics
/// they expose and how deposit allowance is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolFamily {
    #[default]
    Fuse,
    Vesta,
}

impl PoolFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolFamily::Fuse => "fuse",
            PoolFamily::Vesta => "vesta",
        }
    }
}

/// Static description of one pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub pool_address: Address,
    pub token_name: String,
    pub token_address: Address,
    pub decimals: u8,
    /// Explicit native-asset flag; when absent the chain decides from the token address
    #[serde(default)]
    pub is_eth: Option<bool>,
    #[serde(default)]
    pub family: PoolFamily,
}

/// Wallet session as seen by the stores
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user: Address,
    pub chain: ChainId,
    pub logged_in: bool,
}

/// Which direction the action footer is set up for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PoolAction {
    #[default]
    Deposit,
    Withdraw,
}

impl PoolAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolAction::Deposit => "Deposit",
            PoolAction::Withdraw => "Withdraw",
        }
    }
}

impl fmt::Display for PoolAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
