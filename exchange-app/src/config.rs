//! Configuration loading from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

use exchange_upstream::UpstreamConfig;

const DEFAULT_CONSUL_ENDPOINT: &str = "http://127.0.0.1:8500";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub debug: bool,
    pub api_name: Option<String>,
    pub shared_secret: Option<String>,
    pub signature_timeout_secs: i64,
    pub require_date: bool,
    pub consul_enabled: bool,
    pub consul_endpoint: String,
    pub provider_base_url: String,
    pub provider_key_name: String,
    pub cache_refresh_minutes: i64,
    pub cache_grace_minutes: i64,
    pub upstream_timeout_secs: u64,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        // CONSUL_IP wins over CONSUL_ENDPOINT.
        let consul_endpoint = match get("CONSUL_IP") {
            Some(ip) => format!("http://{}:8500", ip),
            None => get("CONSUL_ENDPOINT").unwrap_or_else(|| DEFAULT_CONSUL_ENDPOINT.into()),
        };

        Ok(Self {
            port: parse_or(&get, "PORT", 3000)?,
            debug: flag(&get, "APP_DEBUG"),
            api_name: get("API_NAME"),
            shared_secret: get("SHARED_SECRET"),
            signature_timeout_secs: parse_or(&get, "API_SIGNATURE_TIMEOUT", 180)?,
            require_date: flag(&get, "API_REQUIRE_DATE"),
            consul_enabled: flag(&get, "CONSUL_ENABLED"),
            consul_endpoint,
            provider_base_url: get("OER_BASE_URL")
                .unwrap_or_else(|| exchange_upstream::oer::DEFAULT_BASE_URL.into()),
            provider_key_name: get("OER_KEY_NAME")
                .unwrap_or_else(|| exchange_upstream::oer::DEFAULT_KEY_NAME.into()),
            cache_refresh_minutes: parse_or(&get, "CACHE_REFRESH_MINUTES", 60)?,
            cache_grace_minutes: parse_or(&get, "CACHE_GRACE_MINUTES", 180)?,
            upstream_timeout_secs: parse_or(&get, "UPSTREAM_TIMEOUT_SECS", 10)?,
        })
    }

    pub fn upstream(&self) -> UpstreamConfig {
        UpstreamConfig {
            consul_endpoint: self.consul_endpoint.clone(),
            provider_base_url: self.provider_base_url.clone(),
            provider_key_name: self.provider_key_name.clone(),
            timeout: Duration::from_secs(self.upstream_timeout_secs),
        }
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}

fn flag(get: &impl Fn(&str) -> Option<String>, key: &str) -> bool {
    get(key).is_some_and(|v| {
        matches!(
            v.to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "(true)"
        )
    })
}
