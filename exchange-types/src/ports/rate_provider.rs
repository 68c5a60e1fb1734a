//! Exchange rate provider port.
//!
//! This trait defines the interface of the single upstream rate source.
//! Implementations can be HTTP clients, mock providers, etc.

use crate::domain::{CurrencyCode, CurrencyList, RateSet};
use crate::error::ProviderError;

/// Port trait for the upstream exchange rate provider.
#[async_trait::async_trait]
pub trait RateProvider: Send + Sync + 'static {
    /// Lists every currency the provider supports.
    async fn currencies(&self) -> Result<CurrencyList, ProviderError>;

    /// Latest rates with `base` as the base currency.
    /// An empty `symbols` slice asks for every available rate.
    async fn latest(
        &self,
        base: &CurrencyCode,
        symbols: &[CurrencyCode],
    ) -> Result<RateSet, ProviderError>;
}

#[async_trait::async_trait]
impl<P: RateProvider> RateProvider for std::sync::Arc<P> {
    async fn currencies(&self) -> Result<CurrencyList, ProviderError> {
        (**self).currencies().await
    }

    async fn latest(
        &self,
        base: &CurrencyCode,
        symbols: &[CurrencyCode],
    ) -> Result<RateSet, ProviderError> {
        (**self).latest(base, symbols).await
    }
}
