//! Per-family behaviour of a pool store

use crate::math;
use crate::shared::types::PoolFamily;
use super::PoolState;

/// Metrics fetched on top of the common set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraMetrics {
    None,
    PoolBalance,
}

/// How a deposit amount is checked against the allowance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowanceCheck {
    /// Any amount is allowed once the allowance is an unlimited approval
    InfiniteApproval,
    /// The amount must fit in the human-readable allowance
    CoversAmount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolPolicy {
    pub extra_metrics: ExtraMetrics,
    pub allowance_check: AllowanceCheck,
    /// Deposits into a native-asset pool attach the amount as transaction value
    pub native_deposits: bool,
}

impl PoolPolicy {
    pub fn for_family(family: PoolFamily) -> Self {
        match family {
            PoolFamily::Fuse => Self {
                extra_metrics: ExtraMetrics::None,
                allowance_check: AllowanceCheck::InfiniteApproval,
                native_deposits: true,
            },
            PoolFamily::Vesta => Self {
                extra_metrics: ExtraMetrics::PoolBalance,
                allowance_check: AllowanceCheck::CoversAmount,
                native_deposits: false,
            },
        }
    }

    pub fn tracks_human_allowance(&self) -> bool {
        self.allowance_check == AllowanceCheck::CoversAmount
    }

    pub fn allowance_covers(&self, state: &PoolState, amount: f64) -> bool {
        match self.allowance_check {
            AllowanceCheck::InfiniteApproval => state.has_allowance(),
            AllowanceCheck::CoversAmount => {
                let allowance = state
                    .human_allowance
                    .as_deref()
                    .and_then(math::parse_decimal)
                    .unwrap_or(0.0);
                amount <= allowance
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::PoolConfig;
    use alloy_primitives::{Address, U256};

    fn state() -> PoolState {
        PoolState::new(&PoolConfig {
            pool_address: Address::repeat_byte(0xa1),
            token_name: "VST".to_string(),
            token_address: Address::repeat_byte(0xb1),
            decimals: 18,
            is_eth: None,
            family: PoolFamily::Vesta,
        })
    }

    #[test]
    fn test_family_policies() {
        let fuse = PoolPolicy::for_family(PoolFamily::Fuse);
        assert_eq!(fuse.extra_metrics, ExtraMetrics::None);
        assert!(fuse.native_deposits);
        assert!(!fuse.tracks_human_allowance());

        let vesta = PoolPolicy::for_family(PoolFamily::Vesta);
        assert_eq!(vesta.extra_metrics, ExtraMetrics::PoolBalance);
        assert!(!vesta.native_deposits);
        assert!(vesta.tracks_human_allowance());
    }

    #[test]
    fn test_infinite_approval_ignores_amount() {
        let policy = PoolPolicy::for_family(PoolFamily::Fuse);
        let mut state = state();
        state.allowance = Some(U256::from(1_000u64));
        assert!(!policy.allowance_covers(&state, 0.000001));

        state.allowance = Some(U256::MAX);
        assert!(policy.allowance_covers(&state, 1e30));
    }

    #[test]
    fn test_covers_amount_compares_human_allowance() {
        let policy = PoolPolicy::for_family(PoolFamily::Vesta);
        let mut state = state();
        assert!(!policy.allowance_covers(&state, 1.0));

        state.human_allowance = Some("12.5".to_string());
        assert!(policy.allowance_covers(&state, 12.5));
        assert!(!policy.allowance_covers(&state, 12.50001));
    }
}
