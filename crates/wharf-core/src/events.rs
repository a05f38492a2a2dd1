//! Ledger event definitions
//!
//! The off-chain mirror of the receipt contract's event log. Events are
//! recorded in the ledger's drainable buffer and also traced, so both the
//! keeper's report stream and tests can observe them.

use crate::address::Address;
use crate::math::u256_dec;
use crate::position::PositionId;
use ethnum::U256;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEvent {
    Minted {
        id: PositionId,
        owner: Address,
        #[serde(with = "u256_dec")]
        pooled_amount: U256,
        depositor: Address,
    },
    Burned {
        id: PositionId,
    },
    /// A proportional split moved `amount_moved` from `source` into `new`.
    Split {
        source: PositionId,
        new: PositionId,
        #[serde(with = "u256_dec")]
        amount_moved: U256,
    },
    Transferred {
        id: PositionId,
        from: Address,
        to: Address,
    },
}
