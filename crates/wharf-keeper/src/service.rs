//! Sweep service
//!
//! One sweep = load the snapshot, rebuild the per-pool valuators against it,
//! mirror the receipt rows into a fresh ledger, and value every position.
//! Valuation failures are per-position alerts, not sweep failures: the rest
//! of the book still gets priced.

use crate::config::KeeperConfig;
use crate::error::KeeperResult;
use crate::snapshot::{MarketSnapshot, SnapshotFeed, SnapshotPool};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use wharf_core::{PositionId, PositionLedger, Role};
use wharf_pricing::{PoolKey, PoolSource, PriceFeed, ReferenceConfig, ValuatorRegistry};

/// Outcome counters for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Positions valued successfully
    pub valued: usize,
    /// Positions rejected by oracle- or market-integrity checks
    pub alerts: usize,
    /// Receipt rows referencing pools this keeper does not monitor
    pub skipped: usize,
}

pub struct Keeper {
    config: KeeperConfig,
}

impl Keeper {
    pub fn new(config: KeeperConfig) -> Self {
        Self { config }
    }

    /// Run sweeps until shutdown, or a single one with `once`.
    pub async fn run(&self, once: bool) -> KeeperResult<()> {
        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));
        loop {
            ticker.tick().await;
            match self.run_once() {
                Ok(summary) => tracing::info!(
                    valued = summary.valued,
                    alerts = summary.alerts,
                    skipped = summary.skipped,
                    "sweep complete"
                ),
                Err(err) => tracing::error!(%err, "sweep failed"),
            }
            if once {
                return Ok(());
            }
        }
    }

    /// One full sweep against the current snapshot.
    pub fn run_once(&self) -> KeeperResult<SweepSummary> {
        let snapshot = MarketSnapshot::load(&self.config.snapshot_path)?;
        let now = snapshot.taken_at.timestamp();

        let (registry, keys) = self.build_registry(&snapshot)?;
        let ledger = self.mirror_receipts(&snapshot, &keys)?;

        let mut summary = SweepSummary::default();
        for row in &snapshot.receipts {
            let Some(key) = keys.get(row.pool.as_str()) else {
                tracing::warn!(id = row.id, pool = %row.pool, "receipt references unmonitored pool");
                summary.skipped += 1;
                continue;
            };
            let position = ledger.get(PositionId(row.id))?;
            let valuator = registry.get(key)?;

            match valuator.price_liquidity(position.pooled_amount, now) {
                Ok(value) => {
                    tracing::info!(
                        id = row.id,
                        pool = %row.pool,
                        owner = %position.owner,
                        amount = %position.pooled_amount,
                        value = %value,
                        "position valued"
                    );
                    summary.valued += 1;
                }
                Err(err) if err.is_market_integrity() => {
                    tracing::warn!(id = row.id, pool = %row.pool, %err, "pool integrity alert");
                    summary.alerts += 1;
                }
                Err(err) if err.is_oracle_integrity() => {
                    tracing::warn!(id = row.id, pool = %row.pool, %err, "oracle integrity alert");
                    summary.alerts += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(summary)
    }

    /// Build the per-pool valuators against this snapshot's feeds and states.
    fn build_registry(
        &self,
        snapshot: &MarketSnapshot,
    ) -> KeeperResult<(ValuatorRegistry, HashMap<String, PoolKey>)> {
        let mut registry = ValuatorRegistry::new();
        let mut keys = HashMap::new();

        for pool_config in &self.config.pools {
            let state = snapshot.pool(&pool_config.name)?;
            let feed: Arc<dyn PriceFeed> =
                Arc::new(SnapshotFeed::new(snapshot.feed(&pool_config.feed)?));
            let pool: Arc<dyn PoolSource> = Arc::new(SnapshotPool::new(state.clone()));

            let reference = match (&pool_config.reference_feed, pool_config.reference_bounds) {
                (Some(name), Some(bounds)) => ReferenceConfig::Native {
                    feed: Arc::new(SnapshotFeed::new(snapshot.feed(name)?)),
                    bounds: bounds.to_bounds()?,
                },
                _ => ReferenceConfig::Stable,
            };

            let key = registry.register(
                pool_config.pair(),
                pool_config.reference_token,
                reference,
                feed,
                pool,
                pool_config.bounds.to_bounds()?,
            )?;
            keys.insert(pool_config.name.clone(), key);
        }
        Ok((registry, keys))
    }

    /// Mirror the snapshot's receipt rows into a fresh ledger, preserving
    /// their upstream ids.
    fn mirror_receipts(
        &self,
        snapshot: &MarketSnapshot,
        keys: &HashMap<String, PoolKey>,
    ) -> KeeperResult<PositionLedger> {
        let authority = self.config.authority;
        let mut ledger = PositionLedger::new(authority);
        ledger.grant_role(authority, authority, Role::Minter)?;

        for row in &snapshot.receipts {
            if !keys.contains_key(row.pool.as_str()) {
                continue;
            }
            ledger.import_position(
                authority,
                PositionId(row.id),
                row.owner,
                row.pooled_amount,
                row.depositor,
            )?;
        }
        Ok(ledger)
    }
}
