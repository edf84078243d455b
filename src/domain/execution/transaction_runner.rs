//! Transaction submission through the wallet

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use tracing::{debug, error, info};

use crate::domain::chain::{PreparedTx, Receipt, TxSubmitter};
use crate::shared::errors::{ChainError, StoreError};
use crate::shared::types::TxHash;
use super::TransactionValidator;

/// Headroom added on top of the gas estimate
pub const GAS_MARGIN_PERCENT: u64 = 20;

/// Gas limit actually sent: the estimate plus the margin, rounded down
pub fn with_gas_margin(estimate: u64) -> u64 {
    let padded = estimate as u128 * (100 + GAS_MARGIN_PERCENT) as u128 / 100;
    u64::try_from(padded).unwrap_or(u64::MAX)
}

/// Validates, prices and submits built transactions, then waits for the receipt.
/// There are no retries here; a failure is returned to the caller.
pub struct TransactionRunner {
    submitter: Arc<dyn TxSubmitter>,
    validator: TransactionValidator,
}

impl TransactionRunner {
    pub fn new(submitter: Arc<dyn TxSubmitter>) -> Self {
        Self {
            submitter,
            validator: TransactionValidator::new(),
        }
    }

    /// Submit `tx` from `from` attaching `value` wei. `on_hash` fires once, as soon
    /// as the chain accepts the transaction and before it is mined.
    pub async fn submit<F>(
        &self,
        tx: PreparedTx,
        from: Address,
        value: U256,
        on_hash: F,
    ) -> Result<Receipt, StoreError>
    where
        F: FnOnce(TxHash) + Send,
    {
        let result = self.try_submit(&tx, from, value, on_hash).await;
        if let Err(err) = &result {
            error!("❌ {} to {} failed: {}", tx.method, tx.to, err);
        }
        result
    }

    async fn try_submit<F>(
        &self,
        tx: &PreparedTx,
        from: Address,
        value: U256,
        on_hash: F,
    ) -> Result<Receipt, StoreError>
    where
        F: FnOnce(TxHash) + Send,
    {
        self.validator.validate_transaction(tx)?;

        let estimate = self.submitter.estimate_gas(tx, from, value).await?;
        let gas = with_gas_margin(estimate);
        debug!("{} gas estimate {} -> sending with {}", tx.method, estimate, gas);

        let hash = self.submitter.send_transaction(tx, from, value, gas).await?;
        info!("📨 {} submitted: {}", tx.method, hash);
        on_hash(hash);

        let receipt = self.submitter.wait_for_receipt(hash).await?;
        if !receipt.success {
            return Err(ChainError::Reverted(hash).into());
        }

        info!("✅ {} mined in block {}", tx.method, receipt.block_number);
        Ok(receipt)
    }
}
