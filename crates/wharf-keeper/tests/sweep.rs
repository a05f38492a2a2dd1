//! Full-sweep tests against on-disk config and snapshot fixtures

use chrono::{TimeZone, Utc};
use ethnum::U256;
use std::collections::HashMap;
use std::str::FromStr;
use wharf_core::Address;
use wharf_keeper::{
    BoundsConfig, FeedRound, Keeper, KeeperConfig, MarketSnapshot, PoolConfig, PoolState,
    ReceiptRow, SweepSummary,
};

const WAD: u128 = 1_000_000_000_000_000_000;

fn addr(n: u8) -> Address {
    Address([n; 20])
}

fn test_config(snapshot_path: &str) -> KeeperConfig {
    KeeperConfig {
        snapshot_path: snapshot_path.to_string(),
        interval_secs: 30,
        authority: Address::from_str("0x00000000000000000000000000000000000000aa").unwrap(),
        pools: vec![PoolConfig {
            name: "USDC/VOLT".to_string(),
            token0: addr(1),
            token0_decimals: 6,
            token1: addr(2),
            token1_decimals: 18,
            stable: false,
            reference_token: addr(1),
            feed: "VOLT/USD".to_string(),
            bounds: BoundsConfig {
                min_price: 1,
                max_price: i64::MAX,
                max_staleness_secs: 3_600,
                max_deviation_bps: 100,
            },
            reference_feed: None,
            reference_bounds: None,
        }],
    }
}

/// A healthy snapshot: pool rate 2500 agrees with the 2500e8 oracle round.
fn healthy_snapshot() -> MarketSnapshot {
    let taken_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    MarketSnapshot {
        taken_at,
        feeds: HashMap::from([(
            "VOLT/USD".to_string(),
            FeedRound {
                price: 2_500_00000000,
                updated_at: taken_at.timestamp(),
            },
        )]),
        pools: HashMap::from([(
            "USDC/VOLT".to_string(),
            PoolState {
                reserve0: U256::new(5_000_000_000_000),
                reserve1: U256::new(2_000 * WAD),
                total_liquidity: U256::new(1_000_000 * WAD),
            },
        )]),
        receipts: vec![
            ReceiptRow {
                id: 7,
                pool: "USDC/VOLT".to_string(),
                owner: addr(9),
                pooled_amount: U256::new(10_000 * WAD),
                depositor: addr(7),
            },
            ReceiptRow {
                id: 8,
                pool: "WETH/OTHER".to_string(),
                owner: addr(9),
                pooled_amount: U256::new(WAD),
                depositor: addr(9),
            },
        ],
    }
}

fn write_fixtures(dir: &std::path::Path, snapshot: &MarketSnapshot) -> KeeperConfig {
    let snapshot_path = dir.join("snapshot.json");
    std::fs::write(&snapshot_path, serde_json::to_string(snapshot).unwrap()).unwrap();
    test_config(snapshot_path.to_str().unwrap())
}

#[test]
fn sweep_values_monitored_receipts_and_skips_foreign_ones() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixtures(dir.path(), &healthy_snapshot());

    let summary = Keeper::new(config).run_once().unwrap();
    assert_eq!(
        summary,
        SweepSummary {
            valued: 1,
            alerts: 0,
            skipped: 1,
        }
    );
}

#[test]
fn sweep_flags_a_manipulated_pool_as_an_alert() {
    let dir = tempfile::tempdir().unwrap();
    let mut snapshot = healthy_snapshot();
    // same oracle round, but the pool was shoved off its rate
    snapshot.pools.insert(
        "USDC/VOLT".to_string(),
        PoolState {
            reserve0: U256::new(10_000_000_000_000),
            reserve1: U256::new(1_000 * WAD),
            total_liquidity: U256::new(1_000_000 * WAD),
        },
    );
    let config = write_fixtures(dir.path(), &snapshot);

    let summary = Keeper::new(config).run_once().unwrap();
    assert_eq!(summary.valued, 0);
    assert_eq!(summary.alerts, 1);
}

#[test]
fn sweep_flags_a_stale_round_as_an_alert() {
    let dir = tempfile::tempdir().unwrap();
    let mut snapshot = healthy_snapshot();
    let taken_at = snapshot.taken_at.timestamp();
    snapshot.feeds.insert(
        "VOLT/USD".to_string(),
        FeedRound {
            price: 2_500_00000000,
            // two hours older than the snapshot instant
            updated_at: taken_at - 7_200,
        },
    );
    let config = write_fixtures(dir.path(), &snapshot);

    let summary = Keeper::new(config).run_once().unwrap();
    assert_eq!(summary.valued, 0);
    assert_eq!(summary.alerts, 1);
}

#[test]
fn sweep_fails_when_the_snapshot_misses_a_monitored_pool() {
    let dir = tempfile::tempdir().unwrap();
    let mut snapshot = healthy_snapshot();
    snapshot.pools.clear();
    let config = write_fixtures(dir.path(), &snapshot);

    assert!(Keeper::new(config).run_once().is_err());
}

#[test]
fn config_file_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keeper.toml");
    let config = test_config("snapshot.json");
    config.save(path.to_str().unwrap()).unwrap();

    let loaded = KeeperConfig::load(path.to_str().unwrap()).unwrap();
    assert_eq!(loaded.pools.len(), 1);
    assert_eq!(loaded.pools[0].reference_token, addr(1));
}
