//! Collection of pool stores for the connected wallet

use std::sync::{Arc, Weak};

use alloy_primitives::Address;
use async_trait::async_trait;
use tokio::sync::{watch, RwLock};
use tracing::{info, warn};

use crate::domain::session::UserStore;
use crate::shared::utils::format_address;
use super::{PoolConfigProvider, PoolStore, SiblingRefresher, StoreSettings};

/// Builds and owns every [`PoolStore`] of the active chain
pub struct PoolCollectionStore {
    user_store: Arc<UserStore>,
    pool_configs: Arc<dyn PoolConfigProvider>,
    settings: StoreSettings,
    stability_pools: RwLock<Vec<Arc<PoolStore>>>,
    loading: watch::Sender<bool>,
    me: Weak<PoolCollectionStore>,
}

impl PoolCollectionStore {
    pub fn new(
        user_store: Arc<UserStore>,
        pool_configs: Arc<dyn PoolConfigProvider>,
        settings: StoreSettings,
    ) -> Arc<Self> {
        let (loading, _) = watch::channel(false);
        Arc::new_cyclic(|me| Self {
            user_store,
            pool_configs,
            settings,
            stability_pools: RwLock::new(Vec::new()),
            loading,
            me: me.clone(),
        })
    }

    /// Rebuild the collection for the current session. Pools are initialized one
    /// after another and the collection is swapped in once all are ready.
    pub async fn on_user_connect(&self) -> usize {
        self.loading.send_replace(true);

        let session = self.user_store.session();
        let configs = if session.logged_in {
            self.pool_configs.get_pools(session.chain)
        } else {
            Vec::new()
        };

        let siblings: Weak<dyn SiblingRefresher> = self.me.clone();
        let mut pools = Vec::with_capacity(configs.len());
        for config in configs {
            let store = PoolStore::new(config, Arc::clone(&self.user_store), Some(siblings.clone()), self.settings);
            if store.init().await.is_err() {
                warn!("⚠️ pool {} added without initial metrics", format_address(&store.pool_address()));
            }
            pools.push(Arc::new(store));
        }

        let count = pools.len();
        *self.stability_pools.write().await = pools;
        self.loading.send_replace(false);

        info!("🏊 Loaded {} stability pools on chain {}", count, session.chain);
        count
    }

    pub async fn stability_pools(&self) -> Vec<Arc<PoolStore>> {
        self.stability_pools.read().await.clone()
    }

    pub async fn pool(&self, pool_address: Address) -> Option<Arc<PoolStore>> {
        self.stability_pools
            .read()
            .await
            .iter()
            .find(|pool| pool.pool_address() == pool_address)
            .cloned()
    }

    pub fn loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }
}

#[async_trait]
impl SiblingRefresher for PoolCollectionStore {
    /// Re-fetch every pool except `excluded_pool`, in collection order
    async fn refresh_stores(&self, excluded_pool: Address) {
        let pools = self.stability_pools().await;
        for pool in pools.iter().filter(|pool| pool.pool_address() != excluded_pool) {
            // a failed fetch is logged by the pool and leaves its state as it was
            let _ = pool.fetch_data().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::simulated_chain::{Fault, SimulatedChain, SimulatedPool};
    use crate::domain::pool::FlowOutcome;
    use crate::infrastructure::PoolRegistry;
    use crate::shared::errors::{ChainError, StoreError};
    use crate::shared::types::{PoolAction, PoolConfig, PoolFamily};
    use alloy_primitives::U256;

    fn user() -> Address {
        Address::repeat_byte(0x11)
    }

    fn pool(byte: u8) -> PoolConfig {
        PoolConfig {
            pool_address: Address::repeat_byte(byte),
            token_name: format!("T{byte:x}"),
            token_address: Address::repeat_byte(byte.wrapping_add(0x10)),
            decimals: 18,
            is_eth: None,
            family: PoolFamily::Fuse,
        }
    }

    struct Harness {
        chain: Arc<SimulatedChain>,
        user_store: Arc<UserStore>,
        collection: Arc<PoolCollectionStore>,
    }

    async fn harness() -> Harness {
        let chain = Arc::new(SimulatedChain::new());
        let mut registry = PoolRegistry::new();
        registry.insert(1, vec![pool(0xa1), pool(0xa2), pool(0xa3)]);
        registry.insert(2, vec![pool(0xc1)]);
        for config in [pool(0xa1), pool(0xa2), pool(0xa3), pool(0xc1)] {
            chain.add_pool(SimulatedPool::new(config)).await;
        }

        let user_store = Arc::new(UserStore::with_backend(chain.clone()));
        let collection = PoolCollectionStore::new(
            Arc::clone(&user_store),
            Arc::new(registry),
            StoreSettings::default(),
        );
        Harness { chain, user_store, collection }
    }

    async fn addresses(collection: &PoolCollectionStore) -> Vec<Address> {
        collection.stability_pools().await.iter().map(|pool| pool.pool_address()).collect()
    }

    #[tokio::test]
    async fn test_connect_builds_pools_in_config_order() {
        let h = harness().await;
        h.user_store.connect(user(), 1);
        let loading = h.collection.subscribe_loading();

        assert_eq!(h.collection.on_user_connect().await, 3);
        assert!(!h.collection.loading());
        assert!(loading.has_changed().unwrap());
        assert_eq!(
            addresses(&h.collection).await,
            vec![Address::repeat_byte(0xa1), Address::repeat_byte(0xa2), Address::repeat_byte(0xa3)]
        );
        for byte in [0xa1, 0xa2, 0xa3] {
            assert_eq!(h.chain.query_count(Address::repeat_byte(byte)).await, 1);
        }
    }

    #[tokio::test]
    async fn test_refresh_skips_excluded_pool() {
        let h = harness().await;
        h.user_store.connect(user(), 1);
        h.collection.on_user_connect().await;

        h.collection.refresh_stores(Address::repeat_byte(0xa2)).await;

        assert_eq!(h.chain.query_count(Address::repeat_byte(0xa1)).await, 2);
        assert_eq!(h.chain.query_count(Address::repeat_byte(0xa2)).await, 1);
        assert_eq!(h.chain.query_count(Address::repeat_byte(0xa3)).await, 2);
    }

    #[tokio::test]
    async fn test_chain_switch_replaces_collection() {
        let h = harness().await;
        h.user_store.connect(user(), 1);
        h.collection.on_user_connect().await;
        let old = h.collection.pool(Address::repeat_byte(0xa1)).await.unwrap();

        h.user_store.connect(user(), 2);
        assert_eq!(h.collection.on_user_connect().await, 1);
        assert_eq!(addresses(&h.collection).await, vec![Address::repeat_byte(0xc1)]);
        assert!(h.collection.pool(old.pool_address()).await.is_none());
    }

    #[tokio::test]
    async fn test_logged_out_session_has_no_pools() {
        let h = harness().await;
        assert_eq!(h.collection.on_user_connect().await, 0);
        assert!(h.collection.stability_pools().await.is_empty());
    }

    #[tokio::test]
    async fn test_pool_with_failed_init_is_kept() {
        let h = harness().await;
        h.user_store.connect(user(), 1);
        h.chain.fail_next(Fault::Tvl).await;

        assert_eq!(h.collection.on_user_connect().await, 3);
        let first = h.collection.pool(Address::repeat_byte(0xa1)).await.unwrap();
        assert!(first.snapshot().last_refreshed.is_none());
        let second = h.collection.pool(Address::repeat_byte(0xa2)).await.unwrap();
        assert!(second.snapshot().last_refreshed.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_flow_refreshes_siblings() {
        let h = harness().await;
        h.user_store.connect(user(), 1);
        h.collection.on_user_connect().await;

        let target = pool(0xa2);
        let ether = U256::from(1_000_000_000_000_000_000u64);
        h.chain.set_wallet_balance(user(), target.token_address, U256::from(10u64) * ether).await;
        h.chain.set_allowance(user(), target.pool_address, U256::MAX).await;
        let store = h.collection.pool(target.pool_address).await.unwrap();
        store.fetch_data().await.unwrap();
        store.open_footer(PoolAction::Deposit);
        assert!(store.on_input_change("5"));

        assert!(store.deposit("5").await.is_confirmed());

        assert_eq!(h.chain.query_count(Address::repeat_byte(0xa1)).await, 2);
        assert_eq!(h.chain.query_count(Address::repeat_byte(0xa2)).await, 3);
        assert_eq!(h.chain.query_count(Address::repeat_byte(0xa3)).await, 2);
        assert_eq!(store.snapshot().user_share_in_usd, "5");
        assert!(!store.snapshot().footer_is_open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_flow_still_refreshes_siblings_and_resets() {
        let h = harness().await;
        h.user_store.connect(user(), 1);
        h.collection.on_user_connect().await;

        let target = pool(0xa2);
        let ether = U256::from(1_000_000_000_000_000_000u64);
        h.chain.set_wallet_balance(user(), target.token_address, U256::from(10u64) * ether).await;
        h.chain.set_allowance(user(), target.pool_address, U256::MAX).await;
        let store = h.collection.pool(target.pool_address).await.unwrap();
        store.fetch_data().await.unwrap();
        store.open_footer(PoolAction::Deposit);
        assert!(store.on_input_change("5"));

        // wallet moves on chain after the amount was typed
        h.chain.set_wallet_balance(user(), target.token_address, U256::from(7u64) * ether).await;
        let mut before = Vec::new();
        for byte in [0xa1, 0xa2, 0xa3] {
            before.push(h.chain.query_count(Address::repeat_byte(byte)).await);
        }

        h.chain.fail_next(Fault::Submit).await;
        let outcome = store.deposit("5").await;
        assert!(matches!(
            outcome,
            FlowOutcome::Failed(StoreError::Chain(ChainError::Submission(_)))
        ));

        assert_eq!(h.chain.query_count(Address::repeat_byte(0xa1)).await, before[0] + 1);
        assert_eq!(h.chain.query_count(Address::repeat_byte(0xa2)).await, before[1] + 1);
        assert_eq!(h.chain.query_count(Address::repeat_byte(0xa3)).await, before[2] + 1);

        let state = store.snapshot();
        assert_eq!(state.wallet_balance, "7");
        assert_eq!(state.val, "0");
        assert!(!state.footer_is_open);
        assert!(!state.tx_in_progress);
    }
}
