//! Reactive store for a single stability pool

use std::sync::{Arc, Weak};
use std::time::Duration;

use alloy_primitives::{Address, U256};
use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::domain::chain::{PoolContext, Receipt};
use crate::domain::execution::TransactionRunner;
use crate::domain::session::UserStore;
use crate::math::{truncate_fixed, DISPLAY_FRACTION_DIGITS};
use crate::shared::errors::{ChainError, StoreError};
use crate::shared::types::{PoolAction, PoolConfig};
use super::{
    validate_amount, ExtraMetrics, FlowOutcome, HumanPoolBalance, PoolMetrics, PoolPolicy, PoolState,
    Refusal, SiblingRefresher, StoreSettings,
};

const NATIVE_DECIMALS: u8 = 18;

enum Flow<'a> {
    Allowance,
    Deposit(&'a str),
    Withdraw(&'a str),
    Claim,
}

impl Flow<'_> {
    fn name(&self) -> &'static str {
        match self {
            Flow::Allowance => "grant allowance",
            Flow::Deposit(_) => "deposit",
            Flow::Withdraw(_) => "withdraw",
            Flow::Claim => "claim reward",
        }
    }

    fn requires_valid_input(&self) -> bool {
        matches!(self, Flow::Deposit(_) | Flow::Withdraw(_))
    }
}

/// Metrics fetched but not yet shown. Dropping it discards the fetch.
#[must_use = "metrics are only shown once applied"]
pub struct PendingUpdate<'a> {
    store: &'a PoolStore,
    metrics: PoolMetrics,
}

impl PendingUpdate<'_> {
    pub fn apply(self) {
        let metrics = self.metrics;
        self.store.state.send_modify(|state| metrics.apply_to(state));
    }
}

/// Owns one [`PoolState`] and is its only writer. Every mutation is a single
/// `watch` commit so subscribers never see a half-applied update.
pub struct PoolStore {
    config: PoolConfig,
    policy: PoolPolicy,
    user_store: Arc<UserStore>,
    runner: TransactionRunner,
    siblings: Option<Weak<dyn SiblingRefresher>>,
    grace_period: Duration,
    state: watch::Sender<PoolState>,
}

impl PoolStore {
    pub fn new(
        config: PoolConfig,
        user_store: Arc<UserStore>,
        siblings: Option<Weak<dyn SiblingRefresher>>,
        settings: StoreSettings,
    ) -> Self {
        let (state, _) = watch::channel(PoolState::new(&config));
        Self {
            policy: PoolPolicy::for_family(config.family),
            runner: TransactionRunner::new(user_store.submitter()),
            config,
            user_store,
            siblings,
            grace_period: settings.grace_period,
            state,
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn pool_address(&self) -> Address {
        self.config.pool_address
    }

    pub fn policy(&self) -> PoolPolicy {
        self.policy
    }

    pub fn snapshot(&self) -> PoolState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PoolState> {
        self.state.subscribe()
    }

    fn context(&self) -> PoolContext {
        PoolContext::new(&self.user_store.session(), &self.config)
    }

    fn is_native(&self) -> bool {
        self.config
            .is_eth
            .unwrap_or_else(|| self.user_store.chain().is_eth(&self.config.token_address))
    }

    pub fn open_footer(&self, action: PoolAction) {
        self.state.send_modify(|state| {
            state.action = action;
            state.footer_is_open = true;
        });
    }

    pub fn close_footer(&self) {
        self.state.send_modify(|state| state.footer_is_open = false);
    }

    /// Validate `input` for the current action and record the verdict
    pub fn validate_input(&self, input: &str) -> bool {
        let mut valid = false;
        self.state.send_modify(|state| {
            let outcome = validate_amount(state, &self.policy, input);
            valid = outcome.is_ok();
            state.record_validation(outcome);
        });
        valid
    }

    /// Store the raw text and validate it in the same commit
    pub fn on_input_change(&self, text: &str) -> bool {
        let mut valid = false;
        self.state.send_modify(|state| {
            state.val = text.to_string();
            let outcome = validate_amount(state, &self.policy, text);
            valid = outcome.is_ok();
            state.record_validation(outcome);
        });
        valid
    }

    pub fn reset(&self) {
        self.state.send_modify(PoolState::reset_session);
    }

    /// First fetch after construction
    pub async fn init(&self) -> Result<(), ChainError> {
        self.fetch_data().await
    }

    /// Fetch and show the pool metrics. On failure the previous metrics stay.
    pub async fn fetch_data(&self) -> Result<(), ChainError> {
        self.fetch_deferred().await?.apply();
        Ok(())
    }

    /// Fetch the pool metrics and hand back the update without showing it
    pub async fn fetch_deferred(&self) -> Result<PendingUpdate<'_>, ChainError> {
        match self.fetch_metrics().await {
            Ok(metrics) => Ok(PendingUpdate { store: self, metrics }),
            Err(err) => {
                error!("❌ fetch for {} pool {} aborted: {}", self.config.token_name, self.config.pool_address, err);
                Err(err)
            }
        }
    }

    async fn fetch_metrics(&self) -> Result<PoolMetrics, ChainError> {
        let chain = self.user_store.chain();
        let ctx = self.context();
        let decimals = self.config.decimals;

        let pool_balance = async {
            match self.policy.extra_metrics {
                ExtraMetrics::PoolBalance => chain.get_pool_balance(&ctx).await.map(Some),
                ExtraMetrics::None => Ok(None),
            }
        };

        let (apr, tvl, wallet_balance, pool_balance, allowance, user_share, collaterals, reward) = futures::join!(
            chain.get_apr(&ctx),
            chain.get_tvl(&ctx),
            chain.get_wallet_balance(&ctx),
            pool_balance,
            chain.get_allowance(&ctx),
            chain.get_user_share_in_usd(&ctx),
            chain.get_collaterals(&ctx),
            chain.get_reward(&ctx)
        );

        // apr is best effort
        let apr = match apr {
            Ok(apr) => Some(apr),
            Err(err) => {
                warn!("⚠️ failed to fetch apr for {}: {}", self.config.token_name, err);
                None
            }
        };

        let tvl = tvl?;
        let allowance = allowance?;
        let human = |raw: U256| truncate_fixed(&chain.normalize(raw, decimals), DISPLAY_FRACTION_DIGITS);

        Ok(PoolMetrics {
            tvl: chain.normalize(tvl.tvl, decimals),
            apr,
            wallet_balance: human(wallet_balance?),
            user_share_in_usd: human(user_share?),
            collateral_ratio: tvl.coll_ratio,
            usd_ratio: tvl.usd_ratio,
            collaterals: collaterals?,
            reward: reward?,
            pool_balance: pool_balance?.map(|balance| HumanPoolBalance {
                eth: chain.normalize(balance.eth, NATIVE_DECIMALS),
                token: chain.normalize(balance.token, decimals),
            }),
            allowance,
            human_allowance: self.policy.tracks_human_allowance().then(|| human(allowance)),
            fetched_at: Utc::now(),
        })
    }

    pub async fn grant_allowance(&self) -> FlowOutcome {
        self.run_flow(Flow::Allowance).await
    }

    pub async fn deposit(&self, amount: &str) -> FlowOutcome {
        self.run_flow(Flow::Deposit(amount)).await
    }

    /// `amount` is in USD and is converted to pool shares before building the call
    pub async fn withdraw(&self, amount: &str) -> FlowOutcome {
        self.run_flow(Flow::Withdraw(amount)).await
    }

    /// Rewards are claimed by withdrawing zero shares
    pub async fn claim_reward(&self) -> FlowOutcome {
        self.run_flow(Flow::Claim).await
    }

    async fn run_flow(&self, flow: Flow<'_>) -> FlowOutcome {
        if let Err(refusal) = self.begin_flow(&flow) {
            debug!("{} on {} refused: {}", flow.name(), self.config.token_name, refusal);
            return FlowOutcome::Refused(refusal);
        }
        info!("🚀 {} on {} pool started", flow.name(), self.config.token_name);

        let result = self.submit_flow(&flow).await;
        self.state.send_modify(|state| match &result {
            Ok(_) => {
                state.success = true;
                state.err = None;
            }
            Err(err) => state.err = Some(err.clone()),
        });

        self.settle().await;

        match result {
            Ok(receipt) => FlowOutcome::Confirmed(receipt),
            Err(err) => {
                error!("❌ {} on {} pool failed: {}", flow.name(), self.config.token_name, err);
                FlowOutcome::Failed(err)
            }
        }
    }

    /// Check the guards and raise the in-progress flag in one commit
    fn begin_flow(&self, flow: &Flow<'_>) -> Result<(), Refusal> {
        let mut refusal = None;
        self.state.send_if_modified(|state| {
            if state.is_busy() {
                refusal = Some(Refusal::Busy);
                return false;
            }
            if flow.requires_valid_input() && state.input_is_valid != Some(true) {
                refusal = Some(Refusal::InputNotValid);
                return false;
            }
            match flow {
                Flow::Allowance => state.allowance_in_progress = true,
                _ => state.tx_in_progress = true,
            }
            true
        });
        refusal.map_or(Ok(()), Err)
    }

    async fn submit_flow(&self, flow: &Flow<'_>) -> Result<Receipt, StoreError> {
        let chain = self.user_store.chain();
        let ctx = self.context();

        let (tx, value) = match flow {
            Flow::Allowance => (chain.grant_allowance(&ctx), U256::ZERO),
            Flow::Deposit(amount) => {
                let raw = chain.denormalize(amount, self.config.decimals)?;
                let value = if self.policy.native_deposits && self.is_native() {
                    raw
                } else {
                    U256::ZERO
                };
                (chain.deposit(&ctx, raw), value)
            }
            Flow::Withdraw(amount) => {
                let share = chain.usd_to_share(&ctx, amount).await?;
                (chain.withdraw(&ctx, share), U256::ZERO)
            }
            Flow::Claim => (chain.withdraw(&ctx, U256::ZERO), U256::ZERO),
        };

        self.runner
            .submit(tx, ctx.user, value, |hash| {
                self.state.send_modify(|state| state.hash = Some(hash));
            })
            .await
    }

    /// Runs on every path once a flow has started
    async fn settle(&self) {
        let (update, _) = tokio::join!(self.fetch_deferred(), tokio::time::sleep(self.grace_period));
        if let Ok(update) = update {
            update.apply();
        }

        if let Some(siblings) = self.siblings.as_ref().and_then(Weak::upgrade) {
            siblings.refresh_stores(self.config.pool_address).await;
        }

        self.reset();
    }
}
