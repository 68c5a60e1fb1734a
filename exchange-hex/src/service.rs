//! Exchange Application Service
//!
//! Turns request parameters into cache lookups and conversions, raising the
//! currency errors the HTTP layer renders. Contains NO transport logic.

use std::sync::Arc;

use tracing::{info, instrument};

use exchange_rates::{FreshnessPolicy, convert_amounts};
use exchange_types::{CurrencyCode, CurrencyError, CurrencyList, RateProvider, RateSet};

use crate::cache::{Lookup, RateCache};

/// Application service for currency operations.
///
/// Generic over `P: RateProvider` so tests can inject a scripted provider.
pub struct ExchangeService<P: RateProvider> {
    cache: RateCache<P>,
}

impl<P: RateProvider> ExchangeService<P> {
    /// Creates a service with the default refresh policy.
    pub fn new(provider: P) -> Self {
        Self::with_cache(RateCache::new(provider, FreshnessPolicy::default()))
    }

    pub fn with_cache(cache: RateCache<P>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &RateCache<P> {
        &self.cache
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────────

    /// Every supported currency.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Arc<CurrencyList>, CurrencyError> {
        self.cache.currencies().await.value().ok_or_else(|| {
            CurrencyError::empty_response("Querying for currency list. Response is invalid.")
        })
    }

    /// Rates with `currency` as the base, optionally restricted to `symbols`.
    #[instrument(skip(self))]
    pub async fn rates(
        &self,
        currency: &str,
        symbols: &[String],
    ) -> Result<Arc<RateSet>, CurrencyError> {
        let invalid_currency = || {
            CurrencyError::invalid_currency(format!(
                "Getting exchange rates. Currency {} is invalid.",
                currency
            ))
            .with_base(currency)
            .with_symbols(symbols.to_vec())
        };
        let invalid_symbols = || {
            CurrencyError::invalid_currency("Getting exchange rates. Symbols are invalid.")
                .with_base(currency)
                .with_symbols(symbols.to_vec())
        };
        let response_invalid = || {
            CurrencyError::empty_response("Getting exchange rates. Response is invalid.")
                .with_base(currency)
                .with_symbols(symbols.to_vec())
        };

        let base: CurrencyCode = currency.parse().map_err(|_| invalid_currency())?;
        let list = self.cache.currencies().await.value().ok_or_else(response_invalid)?;
        if !list.contains_key(&base) {
            return Err(invalid_currency());
        }

        let parsed: Result<Vec<CurrencyCode>, _> = symbols.iter().map(|s| s.parse()).collect();
        let Ok(parsed) = parsed else {
            return Err(invalid_symbols());
        };

        match self.cache.rates(&base, &parsed).await {
            None => Err(invalid_currency()),
            Some(Lookup::Empty) if !symbols.is_empty() => Err(invalid_symbols()),
            Some(lookup) => lookup.value().ok_or_else(response_invalid),
        }
    }

    /// Converts `amounts` from `base` into `currency`.
    ///
    /// Input is validated in order: both currencies present, amounts present
    /// and numeric, then currency membership. No upstream call happens
    /// before the amounts are known to be valid.
    #[instrument(skip(self, amounts), fields(amount_count = amounts.len()))]
    pub async fn convert(
        &self,
        base: &str,
        currency: &str,
        amounts: &[String],
    ) -> Result<Vec<f64>, CurrencyError> {
        if base.trim().is_empty() || currency.trim().is_empty() {
            return Err(CurrencyError::invalid_currency(
                "Converting amounts. Both base currency and exchange currency must be provided.",
            ));
        }

        let amounts = parse_amounts(amounts)
            .map_err(|e| e.with_base(base).with_currency(currency))?;

        let invalid_pair = || {
            CurrencyError::invalid_currency(format!(
                "Converting amounts. Either {} or {} currencies are invalid.",
                base, currency
            ))
            .with_base(base)
            .with_currency(currency)
        };

        let (Ok(from), Ok(to)) = (base.parse::<CurrencyCode>(), currency.parse::<CurrencyCode>())
        else {
            return Err(invalid_pair());
        };

        let response_invalid = || {
            CurrencyError::empty_response("Converting amounts. Response is invalid.")
                .with_base(base)
                .with_currency(currency)
        };

        let list = self.cache.currencies().await.value().ok_or_else(response_invalid)?;
        if !list.contains_key(&from) || !list.contains_key(&to) {
            return Err(invalid_pair());
        }

        let rates = match self.cache.rates(&from, &[]).await {
            None => return Err(invalid_pair()),
            Some(lookup) => lookup.value().ok_or_else(response_invalid)?,
        };

        let rate = *rates.get(&to).ok_or_else(invalid_pair)?;
        let converted = convert_amounts(&amounts, rate);
        info!(%from, %to, rate, "Converted amounts");
        Ok(converted)
    }
}

/// Parses raw amount parameters.
///
/// Accepts decimal and exponent notation with surrounding whitespace;
/// rejects an empty list and any non-finite or non-numeric entry.
pub fn parse_amounts(raw: &[String]) -> Result<Vec<f64>, CurrencyError> {
    if raw.is_empty() {
        return Err(CurrencyError::invalid_amounts(
            "Converting amounts. Must provide a list of amounts to exchange (eg. ?amounts[]=123&amounts[]=456).",
        ));
    }

    raw.iter()
        .map(|value| {
            value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|amount| amount.is_finite())
                .ok_or_else(|| {
                    CurrencyError::invalid_amounts(
                        "Converting amounts. Amounts must be numeric (eg. ?amounts[]=123&amounts[]=456).",
                    )
                })
        })
        .collect()
}
