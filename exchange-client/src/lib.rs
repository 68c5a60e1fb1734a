//! # Exchange Client SDK
//!
//! A typed Rust client for the currency exchange gateway. Requests under
//! `/v1` are signed with the shared secret when credentials are set.

use chrono::{DateTime, Utc};
use exchange_types::{
    ConvertRequest, ConvertResponse, CurrencyList, DATE_HEADER, ErrorResponse, HealthResponse,
    ListResponse, RateSet, RatesResponse, SIGNATURE_HEADER, Secret, format_api_date,
    security::sign_request,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone)]
struct Credentials {
    api_name: String,
    secret: Secret,
}

/// Exchange gateway client.
pub struct ExchangeClient {
    base_url: String,
    credentials: Option<Credentials>,
    http: Client,
}

impl ExchangeClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials: None,
            http: Client::new(),
        }
    }

    /// Signs every request as `api_name` with `secret`.
    pub fn with_credentials(mut self, api_name: impl Into<String>, secret: impl Into<Secret>) -> Self {
        self.credentials = Some(Credentials {
            api_name: api_name.into(),
            secret: secret.into(),
        });
        self
    }

    /// The `X-API-Date` and `X-API-Key` values for a request sent at `now`.
    pub fn signature_headers(&self, now: DateTime<Utc>) -> Option<(String, String)> {
        let creds = self.credentials.as_ref()?;
        let date = format_api_date(now);
        let signature = sign_request(creds.secret.expose(), &creds.api_name, &date);
        Some((date, signature))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Health
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetches the health report. A 503 still carries a report, so it is
    /// returned rather than treated as an error.
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let resp = self.http.get(self.url("/")).send().await?;
        if resp.status().as_u16() == 503 {
            let body = resp.text().await?;
            return Ok(serde_json::from_str(&body)?);
        }
        self.handle_response(resp).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Currencies
    // ─────────────────────────────────────────────────────────────────────────

    /// Lists supported currencies.
    pub async fn list(&self) -> Result<CurrencyList, ClientError> {
        let resp: ListResponse = self.send(self.http.get(self.url("/v1/list"))).await?;
        Ok(resp.currencies)
    }

    /// Gets exchange rates for `base`, optionally restricted to `symbols`.
    pub async fn rates(&self, base: &str, symbols: &[&str]) -> Result<RateSet, ClientError> {
        let query: Vec<(&str, &str)> = symbols.iter().map(|s| ("symbols[]", *s)).collect();
        let req = self
            .http
            .get(self.url(&format!("/v1/rates/{}", base)))
            .query(&query);
        let resp: RatesResponse = self.send(req).await?;
        Ok(resp.rates)
    }

    /// Converts `amounts` from `base` into `currency`.
    pub async fn convert(
        &self,
        base: &str,
        currency: &str,
        amounts: &[f64],
    ) -> Result<Vec<f64>, ClientError> {
        let body = ConvertRequest {
            amounts: amounts.iter().map(|a| serde_json::json!(a)).collect(),
        };
        let req = self
            .http
            .post(self.url(&format!("/v1/convert/{}/{}", base, currency)))
            .json(&body);
        let resp: ConvertResponse = self.send(req).await?;
        Ok(resp.amounts)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, mut req: RequestBuilder) -> Result<T, ClientError> {
        if let Some((date, signature)) = self.signature_headers(Utc::now()) {
            req = req.header(DATE_HEADER, date).header(SIGNATURE_HEADER, signature);
        }
        let resp = req.send().await?;
        self.handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}
