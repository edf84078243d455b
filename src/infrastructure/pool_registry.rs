//! Configured pools per chain

use std::collections::HashMap;

use crate::config::Config;
use crate::domain::pool::PoolConfigProvider;
use crate::shared::types::{ChainId, PoolConfig};

/// [`PoolConfigProvider`] backed by the `[[chains]]` tables of the config file
#[derive(Debug, Clone, Default)]
pub struct PoolRegistry {
    chains: HashMap<ChainId, Vec<PoolConfig>>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::new();
        for chain in &config.chains {
            registry.insert(chain.chain_id, chain.pools.clone());
        }
        registry
    }

    pub fn insert(&mut self, chain: ChainId, pools: Vec<PoolConfig>) {
        self.chains.insert(chain, pools);
    }
}

impl PoolConfigProvider for PoolRegistry {
    fn get_pools(&self, chain: ChainId) -> Vec<PoolConfig> {
        self.chains.get(&chain).cloned().unwrap_or_default()
    }
}
