//! Bounds-checked price oracle reading
//!
//! A raw feed reports rounds of (price, updated_at). Feeds can report
//! transient garbage: negative sentinels, stale rounds, or implausible
//! values from a misconfigured or poisoned source. The bounded reader
//! rejects all of those before a price can propagate into valuation.

use crate::error::{PricingError, PricingResult};
use ethnum::{I256, U256};
use std::sync::Arc;

/// Oracle prices carry 8-decimal precision.
pub const ORACLE_PRICE_DECIMALS: u8 = 8;

/// 10^8, the fixed decimal base of oracle prices.
pub const ORACLE_PRICE_BASE: U256 = U256::new(100_000_000u128);

/// One reported round from a price feed. Read-only, fetched fresh per
/// valuation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleRound {
    /// Raw reported price, 8-decimal fixed point, may be a negative sentinel
    pub price: I256,
    /// Unix timestamp of the round's last update
    pub updated_at: i64,
}

/// External price-feed collaborator.
pub trait PriceFeed: Send + Sync {
    fn latest_round(&self) -> PricingResult<OracleRound>;
}

/// Sanity bounds applied to every oracle read, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValuationBounds {
    pub min_price: I256,
    pub max_price: I256,
    pub max_staleness_secs: u64,
    pub max_deviation_bps: u32,
}

impl ValuationBounds {
    pub fn new(
        min_price: I256,
        max_price: I256,
        max_staleness_secs: u64,
        max_deviation_bps: u32,
    ) -> PricingResult<Self> {
        if min_price < I256::ZERO {
            return Err(PricingError::InvalidParameter {
                parameter: "min_price",
                value: min_price.to_string(),
                expected: "non-negative",
            });
        }
        if max_price < min_price {
            return Err(PricingError::InvalidParameter {
                parameter: "max_price",
                value: max_price.to_string(),
                expected: "at least min_price",
            });
        }
        if max_staleness_secs == 0 {
            return Err(PricingError::InvalidParameter {
                parameter: "max_staleness_secs",
                value: "0".to_string(),
                expected: "greater than 0",
            });
        }
        if max_deviation_bps > 10_000 {
            return Err(PricingError::InvalidParameter {
                parameter: "max_deviation_bps",
                value: max_deviation_bps.to_string(),
                expected: "at most 10000",
            });
        }
        Ok(Self {
            min_price,
            max_price,
            max_staleness_secs,
            max_deviation_bps,
        })
    }
}

/// Validating reader over a raw feed.
#[derive(Clone)]
pub struct BoundedPriceReader {
    feed: Arc<dyn PriceFeed>,
    bounds: ValuationBounds,
}

impl BoundedPriceReader {
    pub fn new(feed: Arc<dyn PriceFeed>, bounds: ValuationBounds) -> Self {
        Self { feed, bounds }
    }

    pub fn bounds(&self) -> &ValuationBounds {
        &self.bounds
    }

    /// Read and validate the latest price.
    ///
    /// Zero is judged by the lower bound, not the negative-sentinel check;
    /// a round exactly at the staleness threshold is still acceptable.
    pub fn read_price(&self, now: i64) -> PricingResult<U256> {
        let round = self.feed.latest_round()?;

        if round.price < I256::ZERO {
            return Err(PricingError::NegativePrice { price: round.price });
        }

        let age_secs = now.saturating_sub(round.updated_at);
        if age_secs > self.bounds.max_staleness_secs as i64 {
            return Err(PricingError::StalePrice {
                age_secs,
                max_staleness_secs: self.bounds.max_staleness_secs,
            });
        }

        if round.price < self.bounds.min_price {
            return Err(PricingError::PriceBelowLowerBound {
                price: round.price,
                min_price: self.bounds.min_price,
            });
        }
        if round.price > self.bounds.max_price {
            return Err(PricingError::PriceAboveUpperBound {
                price: round.price,
                max_price: self.bounds.max_price,
            });
        }

        Ok(round.price.as_u256())
    }
}
