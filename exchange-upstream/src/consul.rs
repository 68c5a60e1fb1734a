//! Consul adapter: key/value reads and agent status.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use exchange_types::{AgentStatus, KeyValueStore, SecretError};

/// One element of the array returned by `GET /v1/kv/{key}`.
#[derive(Debug, Deserialize)]
struct KvEntry {
    #[serde(rename = "Value")]
    value: Option<String>,
}

/// HTTP client for a Consul agent.
pub struct ConsulClient {
    endpoint: String,
    http: reqwest::Client,
    agent_seen: AtomicBool,
}

impl ConsulClient {
    /// Creates a client for the agent at `endpoint` (e.g. `http://127.0.0.1:8500`).
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_http_client(endpoint, reqwest::Client::new())
    }

    /// Creates a client that reuses an existing `reqwest::Client`.
    pub fn with_http_client(endpoint: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            http,
            agent_seen: AtomicBool::new(false),
        }
    }

    async fn query_agent(&self) -> Result<(), SecretError> {
        let url = format!("{}/v1/agent/self", self.endpoint);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| SecretError::UpstreamUnavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(SecretError::UpstreamUnavailable(format!(
                "agent status returned HTTP {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for ConsulClient {
    #[instrument(skip(self))]
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, SecretError> {
        let url = format!("{}/v1/kv/{}", self.endpoint, key);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| SecretError::UpstreamUnavailable(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SecretError::NotFound(key.to_string()));
        }
        if !status.is_success() {
            return Err(SecretError::UpstreamUnavailable(format!(
                "KV read returned HTTP {}",
                status
            )));
        }

        let entries: Vec<KvEntry> = resp
            .json()
            .await
            .map_err(|e| SecretError::UpstreamUnavailable(format!("malformed KV body: {}", e)))?;

        let encoded = entries
            .into_iter()
            .next()
            .and_then(|entry| entry.value)
            .ok_or_else(|| SecretError::NotFound(key.to_string()))?;

        let value = BASE64.decode(encoded.as_bytes()).map_err(|e| {
            SecretError::UpstreamUnavailable(format!("KV value is not base64: {}", e))
        })?;

        debug!(key, bytes = value.len(), "Fetched KV value");
        Ok(value)
    }
}

#[async_trait]
impl AgentStatus for ConsulClient {
    /// Once the agent has answered, later checks are answered from memory.
    async fn agent_alive(&self) -> bool {
        if self.agent_seen.load(Ordering::Relaxed) {
            return true;
        }
        match self.query_agent().await {
            Ok(()) => {
                self.agent_seen.store(true, Ordering::Relaxed);
                true
            }
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "Consul agent unreachable");
                false
            }
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn kv_body(value: &str) -> String {
        format!(r#"[{{"Key":"k","Value":"{}"}}]"#, BASE64.encode(value))
    }

    #[tokio::test]
    async fn test_fetch_decodes_value() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/kv/skeleton-key");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(kv_body("all your base are belong to us"));
            })
            .await;

        let consul = ConsulClient::new(server.base_url());
        let value = consul.fetch("skeleton-key").await.unwrap();

        assert_eq!(value, b"all your base are belong to us");
        mock.assert_calls_async(1).await;
    }

    #[tokio::test]
    async fn test_fetch_missing_key() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/kv/missing");
                then.status(404);
            })
            .await;

        let consul = ConsulClient::new(server.base_url());
        let err = consul.fetch("missing").await.unwrap_err();

        assert_eq!(err, SecretError::NotFound("missing".into()));
    }

    #[tokio::test]
    async fn test_fetch_null_value_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/kv/empty");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(r#"[{"Key":"empty","Value":null}]"#);
            })
            .await;

        let consul = ConsulClient::new(server.base_url());
        let err = consul.fetch("empty").await.unwrap_err();

        assert!(matches!(err, SecretError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/kv/key");
                then.status(500);
            })
            .await;

        let consul = ConsulClient::new(server.base_url());
        let err = consul.fetch("key").await.unwrap_err();

        assert!(matches!(err, SecretError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_is_unavailable() {
        // Nothing listens on port 9 on the test host.
        let consul = ConsulClient::new("http://127.0.0.1:9");
        let err = consul.fetch("key").await.unwrap_err();

        assert!(matches!(err, SecretError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_agent_status_is_memoized_once_alive() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/agent/self");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(r#"{"Config":{}}"#);
            })
            .await;

        let consul = ConsulClient::new(format!("{}/", server.base_url()));
        assert!(consul.agent_alive().await);
        assert!(consul.agent_alive().await);
        assert_eq!(consul.endpoint(), server.base_url());

        mock.assert_calls_async(1).await;
    }

    #[tokio::test]
    async fn test_agent_down() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/agent/self");
                then.status(503);
            })
            .await;

        let consul = ConsulClient::new(server.base_url());
        assert!(!consul.agent_alive().await);
    }
}
