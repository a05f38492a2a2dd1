//! Pool collaborator surface
//!
//! The AMM router is an external collaborator; the valuation engine only
//! consumes its redemption quotes and the pool's current reserves, both
//! injected behind a trait.

use crate::error::PricingResult;
use ethnum::U256;
use serde::{Deserialize, Serialize};
use wharf_core::Address;

/// Withdrawable underlying amounts for some liquidity amount, in each
/// token's native decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolQuote {
    pub amount0: U256,
    pub amount1: U256,
}

/// External AMM collaborator: redemption quoting plus the current reserves.
pub trait PoolSource: Send + Sync {
    /// Amounts of both pooled tokens redeemable for `liquidity`.
    fn quote_remove_liquidity(&self, liquidity: U256) -> PricingResult<PoolQuote>;

    /// Current raw reserves `(reserve0, reserve1)`.
    fn reserves(&self) -> PricingResult<(U256, U256)>;
}

/// One pooled token: identity plus decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: Address,
    pub decimals: u8,
}

/// The token pair a pool trades, with its stable/volatile curve flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolPair {
    pub token0: TokenInfo,
    pub token1: TokenInfo,
    pub stable: bool,
}
