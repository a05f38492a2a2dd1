//! Liquidity receipt position record

use crate::address::Address;
use crate::math::u256_dec;
use ethnum::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique, monotonically assigned, never-reused position identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct PositionId(pub u64);

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One live receipt position.
///
/// A position with a zero pooled amount is never stored; zero means
/// burned/non-existent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Position identifier
    pub id: PositionId,

    /// Current holder; transferable
    pub owner: Address,

    /// Pool share represented, 18-decimal fixed point
    #[serde(with = "u256_dec")]
    pub pooled_amount: U256,

    /// Identity recorded at mint; copied unchanged through every split,
    /// never reassigned
    pub originating_depositor: Address,
}
