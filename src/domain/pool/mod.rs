//! Pool domain - per-pool reactive state and the collection that owns it

mod pool_collection;
mod pool_policy;
mod pool_state;
mod pool_store;
mod validation;

pub use pool_collection::PoolCollectionStore;
pub use pool_policy::{AllowanceCheck, ExtraMetrics, PoolPolicy};
pub use pool_state::{HumanPoolBalance, PoolMetrics, PoolState, WithdrawPreview};
pub use pool_store::{PendingUpdate, PoolStore};
pub use validation::validate_amount;

use std::time::Duration;

use alloy_primitives::Address;
use async_trait::async_trait;
use thiserror::Error;

use crate::domain::chain::Receipt;
use crate::shared::errors::StoreError;
use crate::shared::types::{ChainId, PoolConfig};

/// Which pools exist on a chain
pub trait PoolConfigProvider: Send + Sync {
    fn get_pools(&self, chain: ChainId) -> Vec<PoolConfig>;
}

/// Refreshes every pool of a collection except one. A pool store calls this on
/// its owner after its own flow settles.
#[async_trait]
pub trait SiblingRefresher: Send + Sync {
    async fn refresh_stores(&self, excluded_pool: Address);
}

/// Tunables shared by every pool store of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSettings {
    /// Chain-indexing lag compensation applied before refreshed metrics are shown
    pub grace_period: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(5),
        }
    }
}

/// Why a flow did not start
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    #[error("another transaction is already in progress for this pool")]
    Busy,

    #[error("input has not been validated")]
    InputNotValid,
}

/// How a transaction flow ended. The session fields are reset by the time this
/// is returned, so non-UI callers read the result here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    Confirmed(Receipt),
    Failed(StoreError),
    Refused(Refusal),
}

impl FlowOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, FlowOutcome::Confirmed(_))
    }
}
