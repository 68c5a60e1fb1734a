//! Data Transfer Objects (DTOs) for requests and responses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{CurrencyList, RateSet};

/// `status` value of every successful response.
pub const STATUS_SUCCESS: &str = "success";

/// `status` value of every error envelope.
pub const STATUS_ERROR: &str = "error";

// ─────────────────────────────────────────────────────────────────────────────
// Currency DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Supported currencies.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListResponse {
    #[schema(example = "success")]
    pub status: String,
    /// Currency code to display name
    #[schema(value_type = Object, example = json!({"EUR": "Euro", "ISK": "Icelandic Króna"}))]
    pub currencies: CurrencyList,
}

impl ListResponse {
    pub fn new(currencies: CurrencyList) -> Self {
        Self {
            status: STATUS_SUCCESS.into(),
            currencies,
        }
    }
}

/// Exchange rates for one base currency.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RatesResponse {
    #[schema(example = "success")]
    pub status: String,
    /// Currency code to rate against the base currency
    #[schema(value_type = Object, example = json!({"EUR": 0.007955, "ISK": 1}))]
    pub rates: RateSet,
}

impl RatesResponse {
    pub fn new(rates: RateSet) -> Self {
        Self {
            status: STATUS_SUCCESS.into(),
            rates,
        }
    }
}

/// Amounts converted from `base` into `currency`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConvertResponse {
    #[schema(example = "success")]
    pub status: String,
    #[schema(example = "ISK")]
    pub base: String,
    #[schema(example = "EUR")]
    pub currency: String,
    /// Converted amounts, rounded to two decimals, in request order
    #[schema(example = json!([26.61, 2571.64]))]
    pub amounts: Vec<f64>,
}

impl ConvertResponse {
    pub fn new(base: impl Into<String>, currency: impl Into<String>, amounts: Vec<f64>) -> Self {
        Self {
            status: STATUS_SUCCESS.into(),
            base: base.into(),
            currency: currency.into(),
            amounts,
        }
    }
}

/// JSON body accepted by the convert endpoint.
///
/// Entries may be numbers or numeric strings; anything else is rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ConvertRequest {
    #[serde(default)]
    #[schema(value_type = Object, example = json!([3345, "7126.5"]))]
    pub amounts: Vec<serde_json::Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Health DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Liveness report.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `OK` or `Unavailable`
    #[schema(example = "OK")]
    pub status: String,
    /// Server time, `YYYY-MM-DD HH:MM:SS` UTC
    #[schema(example = "2024-01-01 12:00:00")]
    pub time: String,
    /// Whether the discovery agent answered
    pub agent: bool,
    /// Whether the discovery agent is expected to run
    pub agent_on: bool,
    /// Discovery agent address
    #[schema(example = "http://127.0.0.1:8500")]
    pub agent_addr: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Error DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Error envelope. Diagnostic fields appear only when the server runs in
/// debug mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "error")]
    pub status: String,
    #[schema(example = "ERROR: Getting exchange rates. Currency XYZ is invalid.")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub extra_data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub request_headers: Option<BTreeMap<String, Vec<String>>>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.into(),
            message: message.into(),
            ..Default::default()
        }
    }
}
