//! Pricing error definitions
//!
//! Oracle-integrity failures and market-integrity failures are distinct
//! variants so callers can tell a broken feed from a manipulated pool.

use ethnum::{I256, U256};
use thiserror::Error;
use wharf_core::Address;

pub type PricingResult<T> = std::result::Result<T, PricingError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    // ========================================================================
    // Configuration errors (construction-time, fatal)
    // ========================================================================
    /// Neither pool token matches the configured reference asset
    #[error("Neither token is the reference asset: pool ({token0}, {token1}), reference {reference}")]
    NeitherTokenReference {
        token0: Address,
        token1: Address,
        reference: Address,
    },

    /// The non-reference token must carry 18-decimal precision
    #[error("Unsupported decimals for {token}: {decimals}")]
    UnsupportedDecimals { token: Address, decimals: u8 },

    /// Invalid construction parameter
    #[error("Invalid parameter '{parameter}': got '{value}', expected {expected}")]
    InvalidParameter {
        parameter: &'static str,
        value: String,
        expected: &'static str,
    },

    /// A pool was registered twice under the same key
    #[error("Pool already registered: {key}")]
    AlreadyRegistered { key: String },

    /// Lookup of an unregistered pool
    #[error("Pool not registered: {key}")]
    PoolNotRegistered { key: String },

    // ========================================================================
    // Input-domain errors
    // ========================================================================
    /// Valuation of a zero liquidity amount
    #[error("Zero liquidity amount")]
    ZeroAmount,

    /// Batch valuation with no entries
    #[error("Empty batch")]
    EmptyBatch,

    // ========================================================================
    // Oracle-integrity errors
    // ========================================================================
    /// Raw oracle price was strictly negative
    #[error("Negative oracle price: {price}")]
    NegativePrice { price: I256 },

    /// Round is older than the configured staleness threshold
    #[error("Stale oracle price: {age_secs}s old (max {max_staleness_secs}s)")]
    StalePrice { age_secs: i64, max_staleness_secs: u64 },

    /// Price above the configured sane band
    #[error("Oracle price above upper bound: {price} > {max_price}")]
    PriceAboveUpperBound { price: I256, max_price: I256 },

    /// Price below the configured sane band
    #[error("Oracle price below lower bound: {price} < {min_price}")]
    PriceBelowLowerBound { price: I256, min_price: I256 },

    // ========================================================================
    // Market-integrity errors
    // ========================================================================
    /// Pool-implied value above the oracle-implied value beyond tolerance
    #[error("Price shift high detected: spot/oracle ratio {ratio_bps} bps (tolerance {max_deviation_bps} bps)")]
    PriceShiftHighDetected { ratio_bps: U256, max_deviation_bps: u32 },

    /// Pool-implied value below the oracle-implied value beyond tolerance
    #[error("Price shift low detected: spot/oracle ratio {ratio_bps} bps (tolerance {max_deviation_bps} bps)")]
    PriceShiftLowDetected { ratio_bps: U256, max_deviation_bps: u32 },

    // ========================================================================
    // Math and collaborator errors
    // ========================================================================
    /// Checked arithmetic failed
    #[error("Math overflow in '{operation}'")]
    MathOverflow { operation: &'static str },

    /// Division by zero
    #[error("Division by zero in {context}")]
    DivisionByZero { context: &'static str },

    /// An injected feed or pool source failed to produce data
    #[error("Source error: {reason}")]
    Source { reason: String },
}

impl PricingError {
    /// True for the oracle-integrity family (broken or implausible feed).
    pub fn is_oracle_integrity(&self) -> bool {
        matches!(
            self,
            PricingError::NegativePrice { .. }
                | PricingError::StalePrice { .. }
                | PricingError::PriceAboveUpperBound { .. }
                | PricingError::PriceBelowLowerBound { .. }
        )
    }

    /// True for the market-integrity family (suspected pool manipulation).
    pub fn is_market_integrity(&self) -> bool {
        matches!(
            self,
            PricingError::PriceShiftHighDetected { .. }
                | PricingError::PriceShiftLowDetected { .. }
        )
    }
}
