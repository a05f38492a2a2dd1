//! Liquidity valuation engine
//!
//! Values a pool share in a single 18-decimal unit. Each leg of the
//! redemption quote is priced through a bounded oracle read; the same quote
//! is then re-valued through the pool's own reserve ratio, and the two
//! valuations must agree within the configured tolerance. A pool skewed by
//! a large swap inside the read window moves its reserve ratio while the
//! oracle holds, so the disagreement surfaces as a market-integrity error
//! instead of a silently manipulated value.

use crate::error::{PricingError, PricingResult};
use crate::feed::{BoundedPriceReader, PriceFeed, ValuationBounds, ORACLE_PRICE_BASE};
use crate::pool::{PoolPair, PoolSource, TokenInfo};
use ethnum::U256;
use std::sync::Arc;
use wharf_core::math::{mul_div_floor, pow10};
use wharf_core::{Address, BPS_BASE};

/// How the reference leg of the pair converts into the value unit. Fixed at
/// construction; which variant applies depends on the concrete pool
/// deployment (stable-referenced vs wrapped-native-referenced).
pub enum ReferenceConfig {
    /// The reference token is itself a stable unit; its amount only needs
    /// decimal alignment.
    Stable,
    /// The reference token is a volatile base asset priced by its own feed.
    Native {
        feed: Arc<dyn PriceFeed>,
        bounds: ValuationBounds,
    },
}

enum RefScaling {
    /// Fixed decimal-alignment factor (10^(18 - reference decimals))
    Fixed(U256),
    /// Bounded read of the reference asset's own oracle
    Oracle(BoundedPriceReader),
}

/// Per-call reference conversion, resolved after the oracle reads.
#[derive(Clone, Copy)]
enum RefFactor {
    /// Multiply by a fixed alignment factor
    Align(U256),
    /// Price through the reference oracle's 8-decimal base
    Price(U256),
}

impl RefFactor {
    fn apply(self, amount: U256) -> PricingResult<U256> {
        match self {
            RefFactor::Align(scale) => {
                amount
                    .checked_mul(scale)
                    .ok_or(PricingError::MathOverflow {
                        operation: "align reference decimals",
                    })
            }
            RefFactor::Price(price) => mul_div_floor(amount, price, ORACLE_PRICE_BASE).ok_or(
                PricingError::MathOverflow {
                    operation: "value reference leg",
                },
            ),
        }
    }
}

pub struct Valuator {
    pair: PoolPair,
    reference_is_token0: bool,
    scaling: RefScaling,
    /// Reader for the non-reference token's feed
    reader: BoundedPriceReader,
    pool: Arc<dyn PoolSource>,
    max_deviation_bps: u32,
}

impl std::fmt::Debug for Valuator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Valuator")
            .field("pair", &self.pair)
            .field("reference_is_token0", &self.reference_is_token0)
            .field("max_deviation_bps", &self.max_deviation_bps)
            .finish_non_exhaustive()
    }
}

impl Valuator {
    /// Build a valuator for `pair`, anchored on `reference_token`.
    ///
    /// Fails fast on invalid pairings: the reference must be one of the two
    /// pool tokens, and the non-reference token must carry 18-decimal
    /// precision. No object is created on failure.
    pub fn new(
        pair: PoolPair,
        reference_token: Address,
        reference: ReferenceConfig,
        feed: Arc<dyn PriceFeed>,
        pool: Arc<dyn PoolSource>,
        bounds: ValuationBounds,
    ) -> PricingResult<Self> {
        let reference_is_token0 = if pair.token0.address == reference_token {
            true
        } else if pair.token1.address == reference_token {
            false
        } else {
            return Err(PricingError::NeitherTokenReference {
                token0: pair.token0.address,
                token1: pair.token1.address,
                reference: reference_token,
            });
        };

        let (ref_token, other_token) = if reference_is_token0 {
            (pair.token0, pair.token1)
        } else {
            (pair.token1, pair.token0)
        };

        if other_token.decimals != 18 {
            return Err(PricingError::UnsupportedDecimals {
                token: other_token.address,
                decimals: other_token.decimals,
            });
        }

        let scaling = match reference {
            ReferenceConfig::Stable => {
                if ref_token.decimals > 18 {
                    return Err(PricingError::UnsupportedDecimals {
                        token: ref_token.address,
                        decimals: ref_token.decimals,
                    });
                }
                RefScaling::Fixed(pow10(18 - ref_token.decimals))
            }
            ReferenceConfig::Native {
                feed: ref_feed,
                bounds: ref_bounds,
            } => {
                if ref_token.decimals != 18 {
                    return Err(PricingError::UnsupportedDecimals {
                        token: ref_token.address,
                        decimals: ref_token.decimals,
                    });
                }
                RefScaling::Oracle(BoundedPriceReader::new(ref_feed, ref_bounds))
            }
        };

        Ok(Self {
            pair,
            reference_is_token0,
            scaling,
            reader: BoundedPriceReader::new(feed, bounds),
            pool,
            max_deviation_bps: bounds.max_deviation_bps,
        })
    }

    pub fn pair(&self) -> &PoolPair {
        &self.pair
    }

    pub fn reference_token(&self) -> TokenInfo {
        if self.reference_is_token0 {
            self.pair.token0
        } else {
            self.pair.token1
        }
    }

    /// Value `liquidity` in the 18-decimal unit. Pure read.
    ///
    /// Oracle failures propagate unchanged; deviation failures carry their
    /// own variants so callers can tell a bad feed from a shifted pool.
    pub fn price_liquidity(&self, liquidity: U256, now: i64) -> PricingResult<U256> {
        if liquidity == U256::ZERO {
            return Err(PricingError::ZeroAmount);
        }

        let quote = self.pool.quote_remove_liquidity(liquidity)?;
        let (amount_ref, amount_other) = if self.reference_is_token0 {
            (quote.amount0, quote.amount1)
        } else {
            (quote.amount1, quote.amount0)
        };

        // One bounded read per feed per valuation.
        let other_price = self.reader.read_price(now)?;
        let ref_factor = match &self.scaling {
            RefScaling::Fixed(scale) => RefFactor::Align(*scale),
            RefScaling::Oracle(reader) => RefFactor::Price(reader.read_price(now)?),
        };

        let value_other = mul_div_floor(amount_other, other_price, ORACLE_PRICE_BASE).ok_or(
            PricingError::MathOverflow {
                operation: "value non-reference leg",
            },
        )?;
        let value_ref = ref_factor.apply(amount_ref)?;
        let value_oracle =
            value_ref
                .checked_add(value_other)
                .ok_or(PricingError::MathOverflow {
                    operation: "sum legs",
                })?;
        if value_oracle == U256::ZERO {
            // Dust quote redeeming to nothing; there is no price to defend.
            return Ok(U256::ZERO);
        }

        self.check_deviation(amount_ref, amount_other, ref_factor, value_oracle)?;
        Ok(value_oracle)
    }

    /// Value a batch of liquidity amounts against the same instant.
    pub fn price_liquidity_many(
        &self,
        liquidity_amounts: &[U256],
        now: i64,
    ) -> PricingResult<Vec<U256>> {
        if liquidity_amounts.is_empty() {
            return Err(PricingError::EmptyBatch);
        }
        liquidity_amounts
            .iter()
            .map(|&liquidity| self.price_liquidity(liquidity, now))
            .collect()
    }

    /// Re-value the quote through the pool's spot reserve ratio and compare
    /// against the oracle-anchored value.
    fn check_deviation(
        &self,
        amount_ref: U256,
        amount_other: U256,
        ref_factor: RefFactor,
        value_oracle: U256,
    ) -> PricingResult<()> {
        let (reserve0, reserve1) = self.pool.reserves()?;
        let (reserve_ref, reserve_other) = if self.reference_is_token0 {
            (reserve0, reserve1)
        } else {
            (reserve1, reserve0)
        };
        if reserve_other == U256::ZERO {
            return Err(PricingError::DivisionByZero {
                context: "pool reserves",
            });
        }

        // Convert the non-reference leg into reference units at the pool's
        // own exchange rate, then apply the same reference conversion.
        let other_in_ref =
            mul_div_floor(amount_other, reserve_ref, reserve_other).ok_or(
                PricingError::MathOverflow {
                    operation: "spot conversion",
                },
            )?;
        let spot_in_ref =
            amount_ref
                .checked_add(other_in_ref)
                .ok_or(PricingError::MathOverflow {
                    operation: "spot sum",
                })?;
        let value_spot = ref_factor.apply(spot_in_ref)?;

        let ratio_bps = mul_div_floor(value_spot, BPS_BASE, value_oracle).ok_or(
            PricingError::MathOverflow {
                operation: "deviation ratio",
            },
        )?;

        let tolerance = U256::new(self.max_deviation_bps as u128);
        if ratio_bps > BPS_BASE + tolerance {
            return Err(PricingError::PriceShiftHighDetected {
                ratio_bps,
                max_deviation_bps: self.max_deviation_bps,
            });
        }
        // tolerance <= BPS_BASE by construction, so the subtraction is safe
        if ratio_bps < BPS_BASE - tolerance {
            return Err(PricingError::PriceShiftLowDetected {
                ratio_bps,
                max_deviation_bps: self.max_deviation_bps,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::OracleRound;
    use crate::pool::PoolQuote;
    use ethnum::I256;

    struct FixedFeed(OracleRound);

    impl PriceFeed for FixedFeed {
        fn latest_round(&self) -> PricingResult<OracleRound> {
            Ok(self.0)
        }
    }

    struct FixedPool {
        quote: PoolQuote,
        reserves: (U256, U256),
    }

    impl PoolSource for FixedPool {
        fn quote_remove_liquidity(&self, _liquidity: U256) -> PricingResult<PoolQuote> {
            Ok(self.quote)
        }

        fn reserves(&self) -> PricingResult<(U256, U256)> {
            Ok(self.reserves)
        }
    }

    fn addr(n: u8) -> Address {
        Address([n; 20])
    }

    fn token(n: u8, decimals: u8) -> TokenInfo {
        TokenInfo {
            address: addr(n),
            decimals,
        }
    }

    fn bounds() -> ValuationBounds {
        ValuationBounds::new(I256::new(1), I256::new(i128::MAX), 3_600, 100).unwrap()
    }

    fn feed(price: i128) -> Arc<dyn PriceFeed> {
        Arc::new(FixedFeed(OracleRound {
            price: I256::new(price),
            updated_at: 0,
        }))
    }

    #[test]
    fn test_rejects_foreign_reference_token() {
        let pair = PoolPair {
            token0: token(1, 6),
            token1: token(2, 18),
            stable: true,
        };
        let err = Valuator::new(
            pair,
            addr(9),
            ReferenceConfig::Stable,
            feed(100_000_000),
            Arc::new(FixedPool {
                quote: PoolQuote {
                    amount0: U256::ZERO,
                    amount1: U256::ZERO,
                },
                reserves: (U256::ONE, U256::ONE),
            }),
            bounds(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, PricingError::NeitherTokenReference { .. }));
    }

    #[test]
    fn test_rejects_non_wad_counterpart_token() {
        let pair = PoolPair {
            token0: token(1, 6),
            token1: token(2, 8),
            stable: true,
        };
        let err = Valuator::new(
            pair,
            addr(1),
            ReferenceConfig::Stable,
            feed(100_000_000),
            Arc::new(FixedPool {
                quote: PoolQuote {
                    amount0: U256::ZERO,
                    amount1: U256::ZERO,
                },
                reserves: (U256::ONE, U256::ONE),
            }),
            bounds(),
        )
        .err()
        .unwrap();
        assert_eq!(
            err,
            PricingError::UnsupportedDecimals {
                token: addr(2),
                decimals: 8
            }
        );
    }

    #[test]
    fn test_zero_liquidity_is_input_domain_error() {
        let pair = PoolPair {
            token0: token(1, 6),
            token1: token(2, 18),
            stable: true,
        };
        let valuator = Valuator::new(
            pair,
            addr(1),
            ReferenceConfig::Stable,
            feed(100_000_000),
            Arc::new(FixedPool {
                quote: PoolQuote {
                    amount0: U256::ZERO,
                    amount1: U256::ZERO,
                },
                reserves: (U256::ONE, U256::ONE),
            }),
            bounds(),
        )
        .unwrap();
        assert_eq!(
            valuator.price_liquidity(U256::ZERO, 0).unwrap_err(),
            PricingError::ZeroAmount
        );
        assert_eq!(
            valuator.price_liquidity_many(&[], 0).unwrap_err(),
            PricingError::EmptyBatch
        );
    }
}
