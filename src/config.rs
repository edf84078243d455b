use alloy_primitives::Address;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path, time::Duration};

use crate::domain::chain::Collateral;
use crate::domain::pool::StoreSettings;
use crate::shared::types::{ChainId, PoolConfig};

fn default_grace_period_ms() -> u64 {
    5_000
}

fn default_gas_estimate() -> u64 {
    150_000
}

fn zero() -> String {
    "0".to_string()
}

fn one() -> String {
    "1".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreCfg {
    /// Wait after a settled transaction before showing refreshed metrics
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,
}

impl Default for StoreCfg {
    fn default() -> Self {
        Self {
            grace_period_ms: default_grace_period_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainCfg {
    pub chain_id: ChainId,
    pub name: String,
    #[serde(default)]
    pub pools: Vec<PoolConfig>,
}

/// Seed for one pool of the simulated chain; amounts are human decimals
#[derive(Debug, Clone, Deserialize)]
pub struct SimulatedPoolCfg {
    pub pool_address: Address,
    #[serde(default = "zero")]
    pub tvl: String,
    #[serde(default = "zero")]
    pub apr: String,
    #[serde(default = "one")]
    pub usd_ratio: String,
    #[serde(default = "zero")]
    pub coll_ratio: String,
    #[serde(default = "zero")]
    pub wallet_balance: String,
    #[serde(default = "zero")]
    pub share: String,
    #[serde(default = "zero")]
    pub reward: String,
    #[serde(default = "zero")]
    pub pool_eth: String,
    #[serde(default = "zero")]
    pub pool_token: String,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub collaterals: Vec<Collateral>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationCfg {
    pub user: Address,
    #[serde(default = "zero")]
    pub native_balance: String,
    #[serde(default = "default_gas_estimate")]
    pub gas_estimate: u64,
    #[serde(default)]
    pub pools: Vec<SimulatedPoolCfg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreCfg,
    #[serde(default)]
    pub chains: Vec<ChainCfg>,
    pub simulation: Option<SimulationCfg>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path.as_ref())
            .with_context(|| format!("read {}", path.as_ref().display()))?;
        Self::from_toml(&s)
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s).context("parse Config.toml")?;
        Ok(cfg)
    }

    /// Pools configured for `chain_id`, in file order
    pub fn pools_for_chain(&self, chain_id: ChainId) -> Vec<PoolConfig> {
        self.chains
            .iter()
            .find(|chain| chain.chain_id == chain_id)
            .map(|chain| chain.pools.clone())
            .unwrap_or_default()
    }

    pub fn default_chain(&self) -> Option<ChainId> {
        self.chains.first().map(|chain| chain.chain_id)
    }

    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            grace_period: Duration::from_millis(self.store.grace_period_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::PoolFamily;

    const SAMPLE: &str = r#"
        [store]
        grace_period_ms = 2500

        [[chains]]
        chain_id = 1
        name = "mainnet"

        [[chains.pools]]
        pool_address = "0x00000000000000000000000000000000000000a1"
        token_name = "ETH"
        token_address = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE"
        decimals = 18
        is_eth = true

        [[chains.pools]]
        pool_address = "0x00000000000000000000000000000000000000a2"
        token_name = "VST"
        token_address = "0x00000000000000000000000000000000000000b2"
        decimals = 18
        family = "vesta"

        [simulation]
        user = "0x1111111111111111111111111111111111111111"
        native_balance = "3"

        [[simulation.pools]]
        pool_address = "0x00000000000000000000000000000000000000a2"
        tvl = "1000"
        wallet_balance = "250.5"
        approved = true
    "#;

    #[test]
    fn test_parse_sample_config() {
        let cfg = Config::from_toml(SAMPLE).unwrap();
        assert_eq!(cfg.store.grace_period_ms, 2500);
        assert_eq!(cfg.default_chain(), Some(1));

        let pools = cfg.pools_for_chain(1);
        assert_eq!(pools.len(), 2);
        assert_eq!(pools[0].is_eth, Some(true));
        assert_eq!(pools[0].family, PoolFamily::Fuse);
        assert_eq!(pools[1].family, PoolFamily::Vesta);
        assert!(cfg.pools_for_chain(42).is_empty());

        let simulation = cfg.simulation.unwrap();
        assert_eq!(simulation.gas_estimate, 150_000);
        assert_eq!(simulation.pools[0].usd_ratio, "1");
        assert!(simulation.pools[0].approved);
    }

    #[test]
    fn test_store_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg.store_settings().grace_period, Duration::from_secs(5));
        assert!(cfg.simulation.is_none());
        assert_eq!(cfg.default_chain(), None);
    }
}
