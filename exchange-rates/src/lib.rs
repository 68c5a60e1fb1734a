//! Currency Codes, Rate Arithmetic and Cache Freshness Rules
//!
//! This library holds the pure, IO-free building blocks of the exchange
//! gateway:
//!
//! - [`CurrencyCode`] - a validated three-letter ISO-style code
//! - [`convert_amounts`] / [`round_to`] - rate application with
//!   round-half-away-from-zero at a fixed number of decimals
//! - [`FreshnessPolicy`] / [`CacheEntry`] - the refresh-ahead-with-grace
//!   rule shared by every cached upstream resource
//!
//! # Example
//! ```
//! use exchange_rates::{CurrencyCode, FreshnessPolicy, Staleness, convert_amounts};
//!
//! let isk: CurrencyCode = "ISK".parse().unwrap();
//! assert_eq!(isk.as_str(), "ISK");
//!
//! assert_eq!(convert_amounts(&[3345.0], 0.007955), vec![26.61]);
//!
//! let policy = FreshnessPolicy::default();
//! assert_eq!(policy.assess(100, 159), Staleness::Fresh);
//! assert_eq!(policy.assess(100, 160), Staleness::RefreshDue);
//! ```

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ─────────────────────────────────────────────────────────────────────────────
// Currency Code
// ─────────────────────────────────────────────────────────────────────────────

/// Error returned when a string is not shaped like a currency code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid currency code: {0:?}")]
pub struct CurrencyCodeError(pub String);

/// A three-letter uppercase currency identifier such as `ISK` or `EUR`.
///
/// Only the shape is checked here. Whether a code is actually supported is
/// decided by membership in the currency list fetched from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, utoipa::ToSchema)]
#[schema(example = "ISK")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Length of every currency code.
    pub const LEN: usize = 3;

    /// Validates and wraps a code. Lowercase input is rejected.
    pub fn new(code: impl Into<String>) -> Result<Self, CurrencyCodeError> {
        let code = code.into();
        if code.len() == Self::LEN && code.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(Self(code))
        } else {
            Err(CurrencyCodeError(code))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = CurrencyCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for CurrencyCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CurrencyCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        CurrencyCode::new(raw).map_err(serde::de::Error::custom)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rate Arithmetic
// ─────────────────────────────────────────────────────────────────────────────

/// Number of decimals converted amounts are rounded to.
pub const AMOUNT_DECIMALS: u32 = 2;

fn to_decimal(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value)
}

fn round_decimal(value: Decimal, places: u32) -> Option<f64> {
    value
        .round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
}

/// Rounds half away from zero at `places` decimals.
///
/// Values are read as the shortest decimal that yields the same `f64`, so
/// `1.005` rounds to `1.01`. Values outside the decimal range are returned
/// unchanged.
pub fn round_to(value: f64, places: u32) -> f64 {
    to_decimal(value)
        .and_then(|d| round_decimal(d, places))
        .unwrap_or(value)
}

/// Applies `rate` to every amount and rounds to [`AMOUNT_DECIMALS`].
///
/// The product is taken in decimal arithmetic.
pub fn convert_amounts(amounts: &[f64], rate: f64) -> Vec<f64> {
    let rate_decimal = to_decimal(rate);
    amounts
        .iter()
        .map(|&amount| {
            rate_decimal
                .zip(to_decimal(amount))
                .and_then(|(rate, amount)| amount.checked_mul(rate))
                .and_then(|product| round_decimal(product, AMOUNT_DECIMALS))
                .unwrap_or_else(|| round_to(amount * rate, AMOUNT_DECIMALS))
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Cache Freshness
// ─────────────────────────────────────────────────────────────────────────────

/// Converts a Unix timestamp in seconds into whole minutes since the epoch.
pub fn epoch_minute(unix_seconds: i64) -> i64 {
    unix_seconds.div_euclid(60)
}

/// A cached value stamped with the minute it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub value: T,
    pub fetched_at_minute: i64,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, fetched_at_minute: i64) -> Self {
        Self {
            value,
            fetched_at_minute: fetched_at_minute.max(0),
        }
    }

    /// Whole minutes elapsed since the fetch. Never negative.
    pub fn age(&self, now_minute: i64) -> i64 {
        (now_minute - self.fetched_at_minute).max(0)
    }
}

/// Where an entry sits relative to the freshness threshold and grace window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    /// Younger than the refresh threshold; serve without touching upstream.
    Fresh,
    /// A refresh is due, but the entry may still be served if it fails.
    RefreshDue,
    /// Past the grace window; the entry must not be served.
    Expired,
}

/// Refresh-ahead rule: refresh after `refresh_after_minutes`, keep serving
/// last-known-good data up to `grace_minutes` of age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    pub refresh_after_minutes: i64,
    pub grace_minutes: i64,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            refresh_after_minutes: 60,
            grace_minutes: 180,
        }
    }
}

impl FreshnessPolicy {
    pub fn new(refresh_after_minutes: i64, grace_minutes: i64) -> Self {
        Self {
            refresh_after_minutes,
            grace_minutes: grace_minutes.max(refresh_after_minutes),
        }
    }

    /// Classifies an entry fetched at `fetched_at_minute` as seen at `now_minute`.
    pub fn assess(&self, fetched_at_minute: i64, now_minute: i64) -> Staleness {
        let age = (now_minute - fetched_at_minute).max(0);
        if age < self.refresh_after_minutes {
            Staleness::Fresh
        } else if age <= self.grace_minutes {
            Staleness::RefreshDue
        } else {
            Staleness::Expired
        }
    }

    /// Convenience wrapper over [`FreshnessPolicy::assess`].
    pub fn assess_entry<T>(&self, entry: &CacheEntry<T>, now_minute: i64) -> Staleness {
        self.assess(entry.fetched_at_minute, now_minute)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_code_parse() {
        assert_eq!("ISK".parse::<CurrencyCode>().unwrap().as_str(), "ISK");
        assert!("isk".parse::<CurrencyCode>().is_err());
        assert!("EURO".parse::<CurrencyCode>().is_err());
        assert!("E1R".parse::<CurrencyCode>().is_err());
        assert!("".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_currency_code_display() {
        let code = CurrencyCode::new("USD").unwrap();
        assert_eq!(code.to_string(), "USD");
    }

    #[test]
    fn test_currency_code_serde() {
        let code: CurrencyCode = serde_json::from_str("\"EUR\"").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"EUR\"");
        assert!(serde_json::from_str::<CurrencyCode>("\"eur\"").is_err());
    }

    #[test]
    fn test_currency_codes_sort_alphabetically() {
        let mut codes: Vec<CurrencyCode> = ["USD", "EUR", "ISK"]
            .iter()
            .map(|c| c.parse().unwrap())
            .collect();
        codes.sort();
        let sorted: Vec<&str> = codes.iter().map(CurrencyCode::as_str).collect();
        assert_eq!(sorted, vec!["EUR", "ISK", "USD"]);
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round_to(1.005, 2), 1.01);
        assert_eq!(round_to(26.609475, 2), 26.61);
        assert_eq!(round_to(-0.125, 2), -0.13);
    }

    #[test]
    fn test_round_out_of_decimal_range() {
        assert_eq!(round_to(1e30, 2), 1e30);
        assert!(round_to(f64::NAN, 2).is_nan());
        assert_eq!(convert_amounts(&[1e30], 2.0), vec![2e30]);
    }

    #[test]
    fn test_convert_amounts() {
        let converted = convert_amounts(&[3345.0, 323274.0, 7126.0], 0.007955);
        assert_eq!(converted, vec![26.61, 2571.64, 56.69]);
    }

    #[test]
    fn test_convert_amounts_identity_rate() {
        let amounts = [1432.0, 564515.0, 2316.0];
        assert_eq!(convert_amounts(&amounts, 1.0), amounts.to_vec());
    }

    #[test]
    fn test_epoch_minute() {
        assert_eq!(epoch_minute(0), 0);
        assert_eq!(epoch_minute(59), 0);
        assert_eq!(epoch_minute(60), 1);
        assert_eq!(epoch_minute(-1), -1);
    }

    #[test]
    fn test_freshness_boundaries() {
        let policy = FreshnessPolicy::default();
        let t = 1_000;
        assert_eq!(policy.assess(t, t), Staleness::Fresh);
        assert_eq!(policy.assess(t, t + 59), Staleness::Fresh);
        assert_eq!(policy.assess(t, t + 60), Staleness::RefreshDue);
        assert_eq!(policy.assess(t, t + 180), Staleness::RefreshDue);
        assert_eq!(policy.assess(t, t + 181), Staleness::Expired);
    }

    #[test]
    fn test_freshness_clock_skew_is_fresh() {
        let policy = FreshnessPolicy::default();
        assert_eq!(policy.assess(500, 400), Staleness::Fresh);
    }

    #[test]
    fn test_grace_never_shorter_than_refresh() {
        let policy = FreshnessPolicy::new(60, 10);
        assert_eq!(policy.grace_minutes, 60);
    }

    #[test]
    fn test_cache_entry_age() {
        let entry = CacheEntry::new("v", 10);
        assert_eq!(entry.age(15), 5);
        assert_eq!(entry.age(5), 0);
        assert_eq!(CacheEntry::new("v", -3).fetched_at_minute, 0);
    }
}
