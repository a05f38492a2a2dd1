//! Ledger error definitions

use crate::address::Address;
use crate::position::PositionId;
use ethnum::U256;
use thiserror::Error;

pub type CoreResult<T> = std::result::Result<T, LedgerError>;

/// Errors raised by the position ledger and capability table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    // ========================================================================
    // Authorization errors
    // ========================================================================
    /// Caller does not hold the admin capability
    #[error("Not admin: {caller}")]
    NotAdmin { caller: Address },

    /// Caller does not hold the minter capability
    #[error("Not minter: {caller}")]
    NotMinter { caller: Address },

    /// Caller is neither the owner nor the owner's approved delegate
    #[error("Not owner or approved: {caller} on position {id}")]
    NotOwnerOrApproved { caller: Address, id: PositionId },

    // ========================================================================
    // Input-domain errors
    // ========================================================================
    /// Split fraction at or above the WAD base (a 100% split is disallowed)
    #[error("Split fraction out of range: {fraction} >= 10^18")]
    SplitOutOfRange { fraction: U256 },

    /// A position cannot be minted with a zero pooled amount
    #[error("Zero pooled amount")]
    ZeroAmount,

    /// Floored split share is zero; a zero-amount receipt cannot exist
    #[error("Split of position {id} with fraction {fraction} yields a zero share")]
    ZeroSplitAmount { id: PositionId, fraction: U256 },

    // ========================================================================
    // State errors
    // ========================================================================
    /// No live position with this id
    #[error("Position not found: {id}")]
    PositionNotFound { id: PositionId },

    /// Imported id collides with a live position
    #[error("Position already exists: {id}")]
    DuplicatePosition { id: PositionId },

    /// Checked arithmetic failed
    #[error("Math overflow in '{operation}'")]
    MathOverflow { operation: &'static str },
}
