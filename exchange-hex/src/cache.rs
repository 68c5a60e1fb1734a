//! Refresh-ahead cache for the currency list and rate sets.
//!
//! Every entry follows the same rule: serve while younger than the refresh
//! threshold, otherwise refresh inline; if the refresh fails keep serving the
//! old entry while it is inside the grace window.
//!
//! An upstream that answers with no data is kept apart from one that cannot
//! be reached: the first surfaces as [`Lookup::Empty`], the second as
//! [`Lookup::Unavailable`]. Neither replaces a servable entry.

use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, error, instrument, warn};

use exchange_rates::{CacheEntry, FreshnessPolicy, Staleness, epoch_minute};
use exchange_types::{CurrencyCode, CurrencyList, ProviderError, RateKey, RateProvider, RateSet};

/// Source of the current minute since the Unix epoch.
pub trait Clock: Send + Sync + 'static {
    fn now_minute(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_minute(&self) -> i64 {
        epoch_minute(chrono::Utc::now().timestamp())
    }
}

/// Outcome of a cache read.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// Served from cache inside the refresh threshold.
    Fresh(T),
    /// Just fetched from upstream.
    Refreshed(T),
    /// Refresh failed; last-known-good value inside the grace window.
    Stale(T),
    /// Upstream answered with no data and nothing is servable.
    Empty,
    /// Upstream failed and nothing is servable.
    Unavailable,
}

impl<T> Lookup<T> {
    pub fn value(self) -> Option<T> {
        match self {
            Lookup::Fresh(v) | Lookup::Refreshed(v) | Lookup::Stale(v) => Some(v),
            Lookup::Empty | Lookup::Unavailable => None,
        }
    }

    pub fn as_ref(&self) -> Option<&T> {
        match self {
            Lookup::Fresh(v) | Lookup::Refreshed(v) | Lookup::Stale(v) => Some(v),
            Lookup::Empty | Lookup::Unavailable => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Lookup::Stale(_))
    }
}

/// Timestamped entries keyed by `K`, each replaced wholesale.
///
/// No map guard is held while the upstream future runs.
struct TimedCache<K, V> {
    entries: DashMap<K, CacheEntry<Arc<V>>>,
}

impl<K, V> TimedCache<K, V>
where
    K: Eq + Hash + Clone + Display,
{
    fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// `fetch` yields `Ok(None)` when upstream answered without data.
    async fn get_or_refresh<F, Fut>(
        &self,
        key: &K,
        policy: &FreshnessPolicy,
        now_minute: i64,
        fetch: F,
    ) -> Lookup<Arc<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<V>, ProviderError>>,
    {
        let cached = self.entries.get(key).map(|entry| entry.value().clone());

        if let Some(entry) = &cached {
            if policy.assess_entry(entry, now_minute) == Staleness::Fresh {
                return Lookup::Fresh(entry.value.clone());
            }
        }

        let (error, outcome) = match fetch().await {
            Ok(Some(value)) => {
                let value = Arc::new(value);
                self.entries
                    .insert(key.clone(), CacheEntry::new(value.clone(), now_minute));
                debug!(%key, "Cache entry refreshed");
                return Lookup::Refreshed(value);
            }
            Ok(None) => ("empty upstream answer".to_string(), Lookup::Empty),
            Err(e) => (e.to_string(), Lookup::Unavailable),
        };

        match cached {
            Some(entry) if policy.assess_entry(&entry, now_minute) == Staleness::RefreshDue => {
                warn!(
                    %key,
                    age_minutes = entry.age(now_minute),
                    %error,
                    "Refresh failed, serving stale entry"
                );
                Lookup::Stale(entry.value)
            }
            _ => {
                error!(%key, %error, "Refresh failed with nothing to serve");
                outcome
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Key of the single currency list entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CurrencyListKey;

impl Display for CurrencyListKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("currencies")
    }
}

/// Two-tier cache over a [`RateProvider`]: the currency list plus one rate
/// set per `(base, symbols)` query.
pub struct RateCache<P: RateProvider> {
    provider: P,
    policy: FreshnessPolicy,
    clock: Arc<dyn Clock>,
    currencies: TimedCache<CurrencyListKey, CurrencyList>,
    rates: TimedCache<RateKey, RateSet>,
}

impl<P: RateProvider> RateCache<P> {
    pub fn new(provider: P, policy: FreshnessPolicy) -> Self {
        Self::with_clock(provider, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(provider: P, policy: FreshnessPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            provider,
            policy,
            clock,
            currencies: TimedCache::new(),
            rates: TimedCache::new(),
        }
    }

    pub fn policy(&self) -> &FreshnessPolicy {
        &self.policy
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Number of cached rate sets.
    pub fn rate_entries(&self) -> usize {
        self.rates.len()
    }

    /// The currency list, refreshed when due.
    ///
    /// An empty upstream answer counts as a failed refresh.
    #[instrument(skip(self))]
    pub async fn currencies(&self) -> Lookup<Arc<CurrencyList>> {
        let now = self.clock.now_minute();
        self.currencies
            .get_or_refresh(&CurrencyListKey, &self.policy, now, || async {
                let list = self.provider.currencies().await?;
                Ok::<_, ProviderError>(Some(list).filter(|list| !list.is_empty()))
            })
            .await
    }

    /// Rates with `base` as the base currency, restricted to `symbols`
    /// (all rates when empty).
    ///
    /// Returns `None` when `base` is not in the current currency list; in
    /// that case no rate request is made. Without a currency list the
    /// lookup is [`Lookup::Unavailable`].
    #[instrument(skip(self, symbols), fields(symbol_count = symbols.len()))]
    pub async fn rates(
        &self,
        base: &CurrencyCode,
        symbols: &[CurrencyCode],
    ) -> Option<Lookup<Arc<RateSet>>> {
        let Some(list) = self.currencies().await.value() else {
            warn!(%base, "Currency list unavailable, skipping rate lookup");
            return Some(Lookup::Unavailable);
        };
        if !list.contains_key(base) {
            debug!(%base, "Base currency not in currency list");
            return None;
        }

        let key = RateKey::new(base.clone(), symbols.iter().cloned());
        let now = self.clock.now_minute();
        let lookup = self
            .rates
            .get_or_refresh(&key, &self.policy, now, || async {
                let symbols: Vec<CurrencyCode> = key.symbols.iter().cloned().collect();
                let rates = self.provider.latest(&key.base, &symbols).await?;
                Ok::<_, ProviderError>(Some(rates).filter(|rates| !rates.is_empty()))
            })
            .await;
        Some(lookup)
    }
}
