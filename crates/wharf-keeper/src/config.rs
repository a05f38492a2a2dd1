//! Keeper configuration loaded from TOML

use crate::error::{KeeperError, KeeperResult};
use ethnum::I256;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::str::FromStr;
use wharf_core::Address;
use wharf_pricing::{PoolPair, TokenInfo, ValuationBounds};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeeperConfig {
    /// Path of the market snapshot JSON produced by the indexer
    pub snapshot_path: String,

    /// Seconds between sweeps
    pub interval_secs: u64,

    /// Identity that administers the mirror ledger and imports receipts
    pub authority: Address,

    /// Pools to monitor and value
    pub pools: Vec<PoolConfig>,
}

/// Configuration for one monitored pool.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolConfig {
    /// Pool name; keys the pool and its receipts inside the snapshot
    pub name: String,

    pub token0: Address,
    pub token0_decimals: u8,
    pub token1: Address,
    pub token1_decimals: u8,

    /// Stable or volatile curve
    pub stable: bool,

    /// Which pool token the valuation anchors on
    pub reference_token: Address,

    /// Snapshot feed name for the non-reference token
    pub feed: String,

    /// Bounds applied to the non-reference feed and the deviation check
    pub bounds: BoundsConfig,

    /// Snapshot feed name for the reference token. Present for
    /// wrapped-native-referenced pools; absent for stable-referenced ones.
    pub reference_feed: Option<String>,

    /// Bounds for the reference feed; required with `reference_feed`
    pub reference_bounds: Option<BoundsConfig>,
}

/// Serializable form of [`ValuationBounds`]. TOML integers are `i64`, which
/// covers every sane 8-decimal price band.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct BoundsConfig {
    pub min_price: i64,
    pub max_price: i64,
    pub max_staleness_secs: u64,
    pub max_deviation_bps: u32,
}

impl BoundsConfig {
    pub fn to_bounds(self) -> KeeperResult<ValuationBounds> {
        Ok(ValuationBounds::new(
            I256::new(i128::from(self.min_price)),
            I256::new(i128::from(self.max_price)),
            self.max_staleness_secs,
            self.max_deviation_bps,
        )?)
    }
}

impl KeeperConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> KeeperResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: KeeperConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &str) -> KeeperResult<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> KeeperResult<()> {
        if self.pools.is_empty() {
            return Err(KeeperError::invalid_config("at least one pool required"));
        }
        if self.interval_secs == 0 {
            return Err(KeeperError::invalid_config("interval_secs must be > 0"));
        }
        if self.authority.is_zero() {
            return Err(KeeperError::invalid_config("authority must be non-zero"));
        }

        let mut names = HashSet::new();
        for pool in &self.pools {
            pool.validate()?;
            if !names.insert(pool.name.as_str()) {
                return Err(KeeperError::invalid_config(format!(
                    "duplicate pool name '{}'",
                    pool.name
                )));
            }
        }
        Ok(())
    }
}

impl PoolConfig {
    pub fn validate(&self) -> KeeperResult<()> {
        if self.name.is_empty() {
            return Err(KeeperError::invalid_config("pool name must be non-empty"));
        }
        if self.reference_token != self.token0 && self.reference_token != self.token1 {
            return Err(KeeperError::invalid_config(format!(
                "pool '{}': reference_token matches neither pool token",
                self.name
            )));
        }
        if self.reference_feed.is_some() != self.reference_bounds.is_some() {
            return Err(KeeperError::invalid_config(format!(
                "pool '{}': reference_feed and reference_bounds must be set together",
                self.name
            )));
        }
        // surface bad bands at load time rather than on the first sweep
        self.bounds.to_bounds()?;
        if let Some(reference_bounds) = self.reference_bounds {
            reference_bounds.to_bounds()?;
        }
        Ok(())
    }

    pub fn pair(&self) -> PoolPair {
        PoolPair {
            token0: TokenInfo {
                address: self.token0,
                decimals: self.token0_decimals,
            },
            token1: TokenInfo {
                address: self.token1,
                decimals: self.token1_decimals,
            },
            stable: self.stable,
        }
    }
}

/// Create an example configuration file.
pub fn create_example_config(path: &str) -> KeeperResult<()> {
    let example = KeeperConfig {
        snapshot_path: "snapshot.json".to_string(),
        interval_secs: 30,
        authority: Address::from_str("0x00000000000000000000000000000000000000aa")
            .map_err(|e| KeeperError::invalid_config(e.to_string()))?,
        pools: vec![PoolConfig {
            name: "USDC/VOLT".to_string(),
            token0: Address([0x01; 20]),
            token0_decimals: 6,
            token1: Address([0x02; 20]),
            token1_decimals: 18,
            stable: false,
            reference_token: Address([0x01; 20]),
            feed: "VOLT/USD".to_string(),
            bounds: BoundsConfig {
                min_price: 1_00000000,
                max_price: 100_000_00000000,
                max_staleness_secs: 3_600,
                max_deviation_bps: 200,
            },
            reference_feed: None,
            reference_bounds: None,
        }],
    };
    example.save(path)
}
