//! Amount validation rules

use crate::math;
use crate::shared::errors::InputRejection;
use crate::shared::types::PoolAction;
use super::{PoolPolicy, PoolState};

/// Check `input` against the pool's current balances. Checks run in a fixed
/// order and the first failure is returned.
pub fn validate_amount(state: &PoolState, policy: &PoolPolicy, input: &str) -> Result<(), InputRejection> {
    let amount = match math::parse_decimal(input) {
        Some(amount) if amount > 0.0 => amount,
        _ => return Err(InputRejection::NotPositive(state.action)),
    };

    match state.action {
        PoolAction::Deposit => {
            if amount > balance(&state.wallet_balance) {
                return Err(InputRejection::InsufficientWalletBalance);
            }
            if !policy.allowance_covers(state, amount) {
                return Err(InputRejection::InsufficientAllowance);
            }
        }
        PoolAction::Withdraw => {
            if amount > balance(&state.user_share_in_usd) {
                return Err(InputRejection::ExceedsBalance(state.action));
            }
        }
    }
    Ok(())
}

fn balance(text: &str) -> f64 {
    math::parse_decimal(text).unwrap_or(0.0)
}
