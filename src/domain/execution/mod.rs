//! Execution domain - transaction validation and submission

mod transaction_runner;
mod transaction_validator;

pub use transaction_runner::{with_gas_margin, TransactionRunner, GAS_MARGIN_PERCENT};
pub use transaction_validator::TransactionValidator;
