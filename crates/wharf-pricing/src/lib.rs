//! Pricing engine for the Wharf workspace
//!
//! Two cooperating pieces: a bounds-checked reader over an injected price
//! feed, and a liquidity valuation engine that prices a pool share at
//! oracle-anchored values while rejecting quotes taken from a manipulated
//! pool. A small registry stamps one configured valuator per pool.
//!
//! Everything here is a pure read: valuation never mutates state, and all
//! external data (oracle rounds, pool quotes, reserves) arrives through
//! dependency-injected traits so the engine stays deterministic under test.

pub mod error;
pub mod feed;
pub mod pool;
pub mod registry;
pub mod valuation;

pub use error::{PricingError, PricingResult};
pub use feed::{BoundedPriceReader, OracleRound, PriceFeed, ValuationBounds, ORACLE_PRICE_BASE};
pub use pool::{PoolPair, PoolQuote, PoolSource, TokenInfo};
pub use registry::{PoolKey, ValuatorRegistry};
pub use valuation::{ReferenceConfig, Valuator};
