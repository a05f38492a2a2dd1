//! Core ledger types for the Wharf engine
//!
//! Holds the fractional position ledger and everything it needs: caller
//! identities, the admin/minter capability table, checked WAD arithmetic,
//! and the typed event log. Pricing lives in `wharf-pricing`; this crate
//! deliberately knows nothing about oracles or pools.

pub mod address;
pub mod error;
pub mod events;
pub mod ledger;
pub mod math;
pub mod position;
pub mod roles;

pub use address::Address;
pub use error::{CoreResult, LedgerError};
pub use events::LedgerEvent;
pub use ledger::PositionLedger;
pub use math::{mul_div_floor, BPS_BASE, WAD};
pub use position::{Position, PositionId};
pub use roles::{Role, RoleTable};
