//! Off-chain valuation sweep service
//!
//! Mirrors receipt rows from a market snapshot into a local position ledger,
//! prices every live position through the bounded valuation engine, and
//! raises alerts for oracle- and market-integrity failures without aborting
//! the sweep.

pub mod config;
pub mod error;
pub mod service;
pub mod snapshot;

pub use config::{BoundsConfig, KeeperConfig, PoolConfig};
pub use error::{KeeperError, KeeperResult};
pub use service::{Keeper, SweepSummary};
pub use snapshot::{FeedRound, MarketSnapshot, PoolState, ReceiptRow, SnapshotFeed, SnapshotPool};
