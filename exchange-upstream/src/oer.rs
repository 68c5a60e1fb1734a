//! Open Exchange Rates client.
//!
//! The provider app id is not configured directly: it is a secret resolved
//! by name through the memoizing [`SecretStore`] on first use.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use exchange_types::{
    CurrencyCode, CurrencyList, KeyValueStore, ProviderError, RateProvider, RateSet, SecretError,
};

use crate::secrets::SecretStore;

/// Public API root of Open Exchange Rates.
pub const DEFAULT_BASE_URL: &str = "https://openexchangerates.org/api";

/// KV key holding the Open Exchange Rates app id.
pub const DEFAULT_KEY_NAME: &str = "open_exchange_rates_key";

#[derive(Debug, Deserialize)]
struct LatestResponse {
    rates: RateSet,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// [`RateProvider`] backed by the Open Exchange Rates HTTP API.
pub struct OpenExchangeRates<K: KeyValueStore> {
    base_url: String,
    key_name: String,
    secrets: Arc<SecretStore<K>>,
    http: reqwest::Client,
}

impl<K: KeyValueStore> OpenExchangeRates<K> {
    pub fn new(
        base_url: impl Into<String>,
        key_name: impl Into<String>,
        secrets: Arc<SecretStore<K>>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            key_name: key_name.into(),
            secrets,
            http,
        }
    }

    async fn app_id(&self) -> Result<String, ProviderError> {
        let secret = self.secrets.get(&self.key_name).await?;
        secret.expose_str().map(str::to_string).ok_or_else(|| {
            ProviderError::Credentials(SecretError::UpstreamUnavailable(format!(
                "{} is not valid UTF-8",
                self.key_name
            )))
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let resp = self
            .http
            .get(format!("{}/{}", self.base_url, path))
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !status.is_success() {
            let detail: ProviderErrorBody = serde_json::from_str(&body).unwrap_or_default();
            let message = detail
                .description
                .or(detail.message)
                .unwrap_or_else(|| status.to_string());
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl<K: KeyValueStore> RateProvider for OpenExchangeRates<K> {
    #[instrument(skip(self))]
    async fn currencies(&self) -> Result<CurrencyList, ProviderError> {
        let app_id = self.app_id().await?;
        let currencies: CurrencyList = self
            .get_json("currencies.json", &[("app_id", app_id)])
            .await?;
        debug!(count = currencies.len(), "Fetched currency list");
        Ok(currencies)
    }

    #[instrument(skip(self, symbols), fields(symbol_count = symbols.len()))]
    async fn latest(
        &self,
        base: &CurrencyCode,
        symbols: &[CurrencyCode],
    ) -> Result<RateSet, ProviderError> {
        let app_id = self.app_id().await?;
        let mut query = vec![("app_id", app_id), ("base", base.to_string())];
        if !symbols.is_empty() {
            let joined: Vec<&str> = symbols.iter().map(CurrencyCode::as_str).collect();
            query.push(("symbols", joined.join(",")));
        }

        let latest: LatestResponse = self.get_json("latest.json", &query).await?;
        debug!(count = latest.rates.len(), "Fetched latest rates");
        Ok(latest.rates)
    }
}
