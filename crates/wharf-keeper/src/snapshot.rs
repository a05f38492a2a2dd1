//! Market snapshot input and its feed/pool adapters
//!
//! The snapshot is the keeper's only data source: a JSON document produced
//! by an external indexer holding the latest oracle rounds, pool states, and
//! receipt rows. The adapters expose slices of it behind the pricing
//! engine's collaborator traits, so a sweep runs against one consistent
//! instant with no live I/O inside the valuation path.

use crate::error::{KeeperError, KeeperResult};
use chrono::{DateTime, Utc};
use ethnum::{I256, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use wharf_core::math::{mul_div_floor, u256_dec};
use wharf_core::Address;
use wharf_pricing::{OracleRound, PoolQuote, PoolSource, PriceFeed, PricingError, PricingResult};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketSnapshot {
    /// Instant the snapshot was taken; staleness is judged against this
    pub taken_at: DateTime<Utc>,

    /// Latest round per feed name
    pub feeds: HashMap<String, FeedRound>,

    /// Pool state per pool name
    pub pools: HashMap<String, PoolState>,

    /// Receipt rows mirrored into the local ledger
    pub receipts: Vec<ReceiptRow>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct FeedRound {
    /// 8-decimal price as reported, sentinel values included
    pub price: i128,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolState {
    #[serde(with = "u256_dec")]
    pub reserve0: U256,
    #[serde(with = "u256_dec")]
    pub reserve1: U256,
    #[serde(with = "u256_dec")]
    pub total_liquidity: U256,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReceiptRow {
    pub id: u64,
    /// Pool name the receipt redeems against
    pub pool: String,
    pub owner: Address,
    #[serde(with = "u256_dec")]
    pub pooled_amount: U256,
    pub depositor: Address,
}

impl MarketSnapshot {
    pub fn load(path: &str) -> KeeperResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn feed(&self, name: &str) -> KeeperResult<FeedRound> {
        self.feeds
            .get(name)
            .copied()
            .ok_or_else(|| KeeperError::MissingFeed {
                name: name.to_string(),
            })
    }

    pub fn pool(&self, name: &str) -> KeeperResult<&PoolState> {
        self.pools
            .get(name)
            .ok_or_else(|| KeeperError::MissingPool {
                name: name.to_string(),
            })
    }
}

/// One snapshot round behind the [`PriceFeed`] trait.
pub struct SnapshotFeed {
    round: OracleRound,
}

impl SnapshotFeed {
    pub fn new(round: FeedRound) -> Self {
        Self {
            round: OracleRound {
                price: I256::new(round.price),
                updated_at: round.updated_at,
            },
        }
    }
}

impl PriceFeed for SnapshotFeed {
    fn latest_round(&self) -> PricingResult<OracleRound> {
        Ok(self.round)
    }
}

/// One snapshot pool state behind the [`PoolSource`] trait. Redemption
/// quotes are the proportional share of the reserves, floored.
pub struct SnapshotPool {
    state: PoolState,
}

impl SnapshotPool {
    pub fn new(state: PoolState) -> Self {
        Self { state }
    }
}

impl PoolSource for SnapshotPool {
    fn quote_remove_liquidity(&self, liquidity: U256) -> PricingResult<PoolQuote> {
        if self.state.total_liquidity == U256::ZERO {
            return Err(PricingError::Source {
                reason: "pool has zero total liquidity".to_string(),
            });
        }
        let amount0 = mul_div_floor(self.state.reserve0, liquidity, self.state.total_liquidity)
            .ok_or(PricingError::MathOverflow {
                operation: "snapshot quote",
            })?;
        let amount1 = mul_div_floor(self.state.reserve1, liquidity, self.state.total_liquidity)
            .ok_or(PricingError::MathOverflow {
                operation: "snapshot quote",
            })?;
        Ok(PoolQuote { amount0, amount1 })
    }

    fn reserves(&self) -> PricingResult<(U256, U256)> {
        Ok((self.state.reserve0, self.state.reserve1))
    }
}
