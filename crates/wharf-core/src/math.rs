//! Checked 256-bit arithmetic shared across the workspace
//!
//! All amounts are 18-decimal fixed-point (`WAD` base) carried in `U256`.
//! Every operation is checked; overflow surfaces as `None` and callers map
//! it to their own error type rather than panicking.

use ethnum::U256;

/// Fixed-point base for pooled amounts and split fractions: 10^18.
pub const WAD: U256 = U256::new(1_000_000_000_000_000_000u128);

/// Basis-point base for deviation checks: 10_000 = 100%.
pub const BPS_BASE: U256 = U256::new(10_000u128);

/// Floor of `a * b / denominator`, or `None` on overflow or zero denominator.
pub fn mul_div_floor(a: U256, b: U256, denominator: U256) -> Option<U256> {
    if denominator == U256::ZERO {
        return None;
    }
    a.checked_mul(b)?.checked_div(denominator)
}

/// 10^decimals as `U256`. Callers bound `decimals` to token precision (<= 38).
pub fn pow10(decimals: u8) -> U256 {
    U256::new(10u128.pow(u32::from(decimals)))
}

/// Serde adapter storing `U256` as a decimal string.
///
/// Keeps snapshot and ledger files human-readable and avoids committing to a
/// binary integer encoding.
pub mod u256_dec {
    use ethnum::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let s = String::deserialize(deserializer)?;
        U256::from_str_radix(&s, 10).map_err(serde::de::Error::custom)
    }
}
