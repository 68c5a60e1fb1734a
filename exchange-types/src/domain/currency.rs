//! Currency list and rate set types.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub use exchange_rates::CurrencyCode;

/// Supported currencies, code to display name. Replaced as a unit.
pub type CurrencyList = BTreeMap<CurrencyCode, String>;

/// Exchange rates for one base currency, code to rate.
pub type RateSet = BTreeMap<CurrencyCode, f64>;

/// Cache key for a rate query: the base plus the sorted requested symbols.
///
/// An empty symbol set means "every rate for this base".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RateKey {
    pub base: CurrencyCode,
    pub symbols: BTreeSet<CurrencyCode>,
}

impl RateKey {
    pub fn new(base: CurrencyCode, symbols: impl IntoIterator<Item = CurrencyCode>) -> Self {
        Self {
            base,
            symbols: symbols.into_iter().collect(),
        }
    }
}

impl fmt::Display for RateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.symbols.is_empty() {
            return write!(f, "{}[*]", self.base);
        }
        let symbols: Vec<&str> = self.symbols.iter().map(CurrencyCode::as_str).collect();
        write!(f, "{}[{}]", self.base, symbols.join(","))
    }
}
