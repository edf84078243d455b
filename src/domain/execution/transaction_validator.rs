//! Transaction validation before submission

use tracing::error;

use crate::domain::chain::PreparedTx;
use crate::shared::errors::StoreError;

/// Validates transactions before execution
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionValidator;

impl TransactionValidator {
    pub fn new() -> Self {
        Self
    }

    /// Reject calls carrying an empty argument or the zero address, which could
    /// send funds to an unset recipient
    pub fn validate_transaction(&self, tx: &PreparedTx) -> Result<(), StoreError> {
        if let Some(index) = tx.args.iter().position(|arg| arg.is_unset()) {
            error!(
                "one of the {} arguments (#{}) is empty or the zero address and might send funds to an invalid account",
                tx.method, index
            );
            return Err(StoreError::InvalidTxArguments {
                method: tx.method.clone(),
                index,
            });
        }
        Ok(())
    }
}
