//! Per-pool valuator registry
//!
//! Stamps one configured [`Valuator`] per (token0, token1, stable) pool and
//! refuses duplicates, so a given pair can never end up with two engines
//! carrying different reference configurations.

use crate::error::{PricingError, PricingResult};
use crate::feed::{PriceFeed, ValuationBounds};
use crate::pool::{PoolPair, PoolSource};
use crate::valuation::{ReferenceConfig, Valuator};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use wharf_core::Address;

/// Identity of one pool: its ordered pair plus the curve flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub token0: Address,
    pub token1: Address,
    pub stable: bool,
}

impl PoolKey {
    pub fn of(pair: &PoolPair) -> Self {
        Self {
            token0: pair.token0.address,
            token1: pair.token1.address,
            stable: pair.stable,
        }
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({})",
            self.token0,
            self.token1,
            if self.stable { "stable" } else { "volatile" }
        )
    }
}

#[derive(Default)]
pub struct ValuatorRegistry {
    valuators: HashMap<PoolKey, Valuator>,
}

impl ValuatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct and register a valuator for `pair`. Construction failures
    /// propagate; an existing registration for the same key is rejected.
    pub fn register(
        &mut self,
        pair: PoolPair,
        reference_token: Address,
        reference: ReferenceConfig,
        feed: Arc<dyn PriceFeed>,
        pool: Arc<dyn PoolSource>,
        bounds: ValuationBounds,
    ) -> PricingResult<PoolKey> {
        let key = PoolKey::of(&pair);
        if self.valuators.contains_key(&key) {
            return Err(PricingError::AlreadyRegistered {
                key: key.to_string(),
            });
        }

        let valuator = Valuator::new(pair, reference_token, reference, feed, pool, bounds)?;
        self.valuators.insert(key, valuator);
        Ok(key)
    }

    pub fn get(&self, key: &PoolKey) -> PricingResult<&Valuator> {
        self.valuators
            .get(key)
            .ok_or_else(|| PricingError::PoolNotRegistered {
                key: key.to_string(),
            })
    }

    pub fn contains(&self, key: &PoolKey) -> bool {
        self.valuators.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.valuators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valuators.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &PoolKey> {
        self.valuators.keys()
    }
}
