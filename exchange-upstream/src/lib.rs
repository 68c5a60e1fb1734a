//! # Exchange Upstream
//!
//! Concrete adapters for the external collaborators of the exchange gateway:
//!
//! - `consul` - Consul KV reads ([`KeyValueStore`]) and agent status ([`AgentStatus`])
//! - `secrets` - process-lifetime memoization of secrets read from KV
//! - `oer` - Open Exchange Rates client ([`RateProvider`])
//!
//! [`KeyValueStore`]: exchange_types::KeyValueStore
//! [`AgentStatus`]: exchange_types::AgentStatus
//! [`RateProvider`]: exchange_types::RateProvider

use std::sync::Arc;
use std::time::Duration;

pub mod consul;
pub mod oer;
pub mod secrets;

pub use consul::ConsulClient;
pub use oer::OpenExchangeRates;
pub use secrets::SecretStore;

/// Settings needed to reach the upstream collaborators.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub consul_endpoint: String,
    pub provider_base_url: String,
    pub provider_key_name: String,
    pub timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            consul_endpoint: "http://127.0.0.1:8500".into(),
            provider_base_url: oer::DEFAULT_BASE_URL.into(),
            provider_key_name: oer::DEFAULT_KEY_NAME.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Wired upstream adapters sharing one HTTP client.
pub struct Upstream {
    pub consul: Arc<ConsulClient>,
    pub secrets: Arc<SecretStore<Arc<ConsulClient>>>,
    pub provider: OpenExchangeRates<Arc<ConsulClient>>,
}

/// Build the upstream adapters from configuration.
///
/// No network calls happen here; secrets and rates are fetched lazily.
///
/// # Examples
///
/// ```ignore
/// let upstream = build_upstream(&UpstreamConfig::default())?;
/// let service = ExchangeService::new(upstream.provider);
/// ```
pub fn build_upstream(config: &UpstreamConfig) -> anyhow::Result<Upstream> {
    let http = reqwest::Client::builder().timeout(config.timeout).build()?;

    let consul = Arc::new(ConsulClient::with_http_client(
        config.consul_endpoint.clone(),
        http.clone(),
    ));
    let secrets = Arc::new(SecretStore::new(consul.clone()));
    let provider = OpenExchangeRates::new(
        config.provider_base_url.clone(),
        config.provider_key_name.clone(),
        secrets.clone(),
        http,
    );

    Ok(Upstream {
        consul,
        secrets,
        provider,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use exchange_types::AgentStatus;

    #[test]
    fn test_build_upstream_is_lazy() {
        let upstream = build_upstream(&UpstreamConfig {
            consul_endpoint: "http://consul.invalid:8500/".into(),
            ..UpstreamConfig::default()
        })
        .unwrap();

        assert_eq!(upstream.consul.endpoint(), "http://consul.invalid:8500");
        assert!(upstream.secrets.is_empty());
    }
}
