use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::domain::chain::{Collateral, Reward};
use crate::math::{self, DISPLAY_FRACTION_DIGITS, INFINITE_APPROVAL_THRESHOLD};
use crate::shared::errors::{InputRejection, StoreError};
use crate::shared::types::{PoolAction, PoolConfig, TxHash};
use crate::shared::utils::format_ratio_percent;

/// Pool contract balances in display units
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HumanPoolBalance {
    pub eth: String,
    pub token: String,
}

/// What a withdrawal of the current input would pay out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithdrawPreview {
    pub usd: String,
    pub coll: String,
}

/// Observable state of one pool.
///
/// Market metrics are only written by a fetch; the session block is written by
/// the input helpers and the transaction flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolState {
    pub asset: String,
    pub decimals: u8,
    pub pool_address: Address,

    pub tvl: String,
    pub apr: Option<String>,
    pub wallet_balance: String,
    pub user_share_in_usd: String,
    pub collateral_ratio: Option<String>,
    pub usd_ratio: Option<String>,
    pub collaterals: Vec<Collateral>,
    pub reward: Option<Reward>,
    pub pool_balance: Option<HumanPoolBalance>,
    #[serde(serialize_with = "serialize_amount")]
    pub allowance: Option<U256>,
    pub human_allowance: Option<String>,
    pub last_refreshed: Option<DateTime<Utc>>,

    pub action: PoolAction,
    pub val: String,
    pub input_is_valid: Option<bool>,
    pub input_err_msg: String,
    pub footer_is_open: bool,
    pub tx_in_progress: bool,
    pub allowance_in_progress: bool,
    pub hash: Option<TxHash>,
    pub success: bool,
    #[serde(serialize_with = "serialize_err")]
    pub err: Option<StoreError>,
}

fn serialize_err<S: Serializer>(err: &Option<StoreError>, serializer: S) -> Result<S::Ok, S::Error> {
    match err {
        Some(err) => serializer.serialize_some(&err.to_string()),
        None => serializer.serialize_none(),
    }
}

fn serialize_amount<S: Serializer>(amount: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error> {
    match amount {
        Some(amount) => serializer.serialize_some(&amount.to_string()),
        None => serializer.serialize_none(),
    }
}

impl PoolState {
    pub fn new(config: &PoolConfig) -> Self {
        Self {
            asset: config.token_name.clone(),
            decimals: config.decimals,
            pool_address: config.pool_address,
            tvl: "0".to_string(),
            apr: None,
            wallet_balance: "0".to_string(),
            user_share_in_usd: "0".to_string(),
            collateral_ratio: None,
            usd_ratio: None,
            collaterals: Vec::new(),
            reward: None,
            pool_balance: None,
            allowance: None,
            human_allowance: None,
            last_refreshed: None,
            action: PoolAction::Deposit,
            val: String::new(),
            input_is_valid: None,
            input_err_msg: String::new(),
            footer_is_open: false,
            tx_in_progress: false,
            allowance_in_progress: false,
            hash: None,
            success: false,
            err: None,
        }
    }

    pub fn has_allowance(&self) -> bool {
        self.allowance
            .is_some_and(|allowance| math::meets_allowance_threshold(allowance, INFINITE_APPROVAL_THRESHOLD))
    }

    pub fn collateral_percent(&self) -> String {
        format_ratio_percent(self.collateral_ratio.as_deref())
    }

    pub fn usd_percent(&self) -> String {
        format_ratio_percent(self.usd_ratio.as_deref())
    }

    pub fn input_is_invalid(&self) -> bool {
        self.input_is_valid == Some(false)
    }

    pub fn is_busy(&self) -> bool {
        self.tx_in_progress || self.allowance_in_progress
    }

    pub fn withdraw_preview(&self) -> WithdrawPreview {
        let amount = math::parse_decimal(&self.val).filter(|amount| *amount > 0.0);
        match amount {
            Some(amount) if self.input_is_valid == Some(true) => WithdrawPreview {
                usd: scaled(amount, self.usd_ratio.as_deref()),
                coll: scaled(amount, self.collateral_ratio.as_deref()),
            },
            _ => WithdrawPreview {
                usd: "0".to_string(),
                coll: "0".to_string(),
            },
        }
    }

    pub(crate) fn record_validation(&mut self, outcome: Result<(), InputRejection>) {
        match outcome {
            Ok(()) => {
                self.input_is_valid = Some(true);
                self.input_err_msg.clear();
            }
            Err(rejection) => {
                self.input_is_valid = Some(false);
                self.input_err_msg = rejection.to_string();
            }
        }
    }

    /// Clear the transient fields of a finished flow
    pub(crate) fn reset_session(&mut self) {
        self.tx_in_progress = false;
        self.allowance_in_progress = false;
        self.success = false;
        self.err = None;
        self.hash = None;
        self.val = "0".to_string();
        self.input_is_valid = None;
        self.input_err_msg.clear();
        self.footer_is_open = false;
    }
}

fn scaled(amount: f64, ratio: Option<&str>) -> String {
    let ratio = ratio.and_then(math::parse_decimal).unwrap_or(0.0);
    math::truncate_fixed(&(amount * ratio).to_string(), DISPLAY_FRACTION_DIGITS)
}

/// One fetch worth of metrics, already converted to display units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolMetrics {
    pub tvl: String,
    pub apr: Option<String>,
    pub wallet_balance: String,
    pub user_share_in_usd: String,
    pub collateral_ratio: String,
    pub usd_ratio: String,
    pub collaterals: Vec<Collateral>,
    pub reward: Reward,
    pub pool_balance: Option<HumanPoolBalance>,
    pub allowance: U256,
    pub human_allowance: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl PoolMetrics {
    pub fn apply_to(self, state: &mut PoolState) {
        state.tvl = self.tvl;
        state.apr = self.apr;
        state.wallet_balance = self.wallet_balance;
        state.user_share_in_usd = self.user_share_in_usd;
        state.collateral_ratio = Some(self.collateral_ratio);
        state.usd_ratio = Some(self.usd_ratio);
        state.collaterals = self.collaterals;
        state.reward = Some(self.reward);
        state.pool_balance = self.pool_balance;
        state.allowance = Some(self.allowance);
        state.human_allowance = self.human_allowance;
        state.last_refreshed = Some(self.fetched_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::PoolFamily;

    fn state() -> PoolState {
        PoolState::new(&PoolConfig {
            pool_address: Address::repeat_byte(0xa1),
            token_name: "LUSD".to_string(),
            token_address: Address::repeat_byte(0xb1),
            decimals: 18,
            is_eth: None,
            family: PoolFamily::Fuse,
        })
    }

    #[test]
    fn test_has_allowance_follows_threshold() {
        let mut state = state();
        assert!(!state.has_allowance());

        state.allowance = Some(INFINITE_APPROVAL_THRESHOLD - U256::from(1));
        assert!(!state.has_allowance());

        state.allowance = Some(INFINITE_APPROVAL_THRESHOLD);
        assert!(state.has_allowance());
    }

    #[test]
    fn test_ratio_percentages() {
        let mut state = state();
        assert_eq!(state.collateral_percent(), "0.00");
        assert_eq!(state.usd_percent(), "0.00");

        state.collateral_ratio = Some("0.25".to_string());
        state.usd_ratio = Some("0.75".to_string());
        assert_eq!(state.collateral_percent(), "25.00");
        assert_eq!(state.usd_percent(), "75.00");
    }

    #[test]
    fn test_withdraw_preview_needs_valid_input() {
        let mut state = state();
        state.usd_ratio = Some("0.5".to_string());
        state.collateral_ratio = Some("0.25".to_string());
        state.val = "10".to_string();
        assert_eq!(state.withdraw_preview().usd, "0");

        state.input_is_valid = Some(true);
        let preview = state.withdraw_preview();
        assert_eq!(preview.usd, "5");
        assert_eq!(preview.coll, "2.5");
    }

    #[test]
    fn test_reset_session_is_idempotent() {
        let mut state = state();
        state.val = "12".to_string();
        state.footer_is_open = true;
        state.tx_in_progress = true;
        state.allowance_in_progress = true;
        state.success = true;
        state.hash = Some(TxHash::repeat_byte(0x42));

        state.reset_session();
        let once = state.clone();
        state.reset_session();
        assert_eq!(state, once);
        assert_eq!(state.val, "0");
        assert!(!state.footer_is_open);
        assert!(!state.tx_in_progress);
        assert!(!state.allowance_in_progress);
        assert!(state.hash.is_none());
    }

    #[test]
    fn test_state_serializes_error_as_text() {
        let mut state = state();
        state.err = Some(StoreError::InvalidTxArguments {
            method: "deposit".to_string(),
            index: 0,
        });
        let json = serde_json::to_value(&state).unwrap();
        assert!(json["err"].as_str().unwrap().starts_with("Invalid transaction arguments for deposit"));
        assert_eq!(json["action"], "Deposit");
    }

    #[test]
    fn test_state_serializes_allowance_as_decimal() {
        let mut state = state();
        assert!(serde_json::to_value(&state).unwrap()["allowance"].is_null());

        state.allowance = Some(U256::from(1000));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["allowance"], "1000");
    }
}
