//! Error handling for the application

use thiserror::Error;

use crate::shared::types::{PoolAction, TxHash};

/// Amount parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),
}

/// Why an entered amount was rejected. The display text is shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputRejection {
    #[error("{0} amount must be positive")]
    NotPositive(PoolAction),

    #[error("Insufficient wallet balance")]
    InsufficientWalletBalance,

    #[error("Insufficient allowance, unlock to grant allowance")]
    InsufficientAllowance,

    #[error("{0} amount is greater than balance")]
    ExceedsBalance(PoolAction),
}

/// Chain-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Query {query} failed: {cause}")]
    Query { query: &'static str, cause: String },

    #[error("Gas estimation failed: {0}")]
    Estimation(String),

    #[error("Transaction submission failed: {0}")]
    Submission(String),

    #[error("Waiting for receipt failed: {0}")]
    Receipt(String),

    #[error("Transaction {0} reverted")]
    Reverted(TxHash),
}

/// Errors raised inside a pool store flow
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error("Invalid transaction arguments for {method}: argument {index} is empty or the zero address")]
    InvalidTxArguments { method: String, index: usize },

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Pool not found: {0}")]
    PoolNotFound(String),
}

impl From<AmountError> for AppError {
    fn from(err: AmountError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}
