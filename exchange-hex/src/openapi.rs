//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use exchange_types::dto::{
    ConvertRequest, ConvertResponse, ErrorResponse, HealthResponse, ListResponse, RatesResponse,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

// Dummy functions to generate path documentation
// These are not the actual handlers, just for OpenAPI path generation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Credentials missing or discovery agent down", body = HealthResponse)
    )
)]
async fn health() {}

/// List supported currencies
#[utoipa::path(
    get,
    path = "/v1/list",
    tag = "currencies",
    security(("api_signature" = [], "api_date" = [])),
    responses(
        (status = 200, description = "Supported currencies", body = ListResponse),
        (status = 400, description = "Malformed X-API-Date", body = ErrorResponse),
        (status = 403, description = "Signature expired or mismatched", body = ErrorResponse),
        (status = 503, description = "Currency list unavailable", body = ErrorResponse)
    )
)]
async fn list() {}

/// Exchange rates for a base currency
#[utoipa::path(
    get,
    path = "/v1/rates/{currency}",
    tag = "currencies",
    security(("api_signature" = [], "api_date" = [])),
    params(
        ("currency" = String, Path, description = "Base currency code"),
        ("symbols[]" = Option<Vec<String>>, Query, description = "Restrict to these currencies")
    ),
    responses(
        (status = 200, description = "Exchange rates", body = RatesResponse),
        (status = 422, description = "Unknown base currency or symbols", body = ErrorResponse),
        (status = 503, description = "Rates unavailable", body = ErrorResponse)
    )
)]
async fn rates() {}

/// Convert amounts between currencies
#[utoipa::path(
    post,
    path = "/v1/convert/{base}/{currency}",
    tag = "currencies",
    security(("api_signature" = [], "api_date" = [])),
    params(
        ("base" = String, Path, description = "Currency the amounts are in"),
        ("currency" = String, Path, description = "Currency to convert into"),
        ("amounts[]" = Option<Vec<String>>, Query, description = "Amounts to convert (GET or POST)")
    ),
    request_body(content = ConvertRequest, description = "Amounts, when not given in the query", content_type = "application/json"),
    responses(
        (status = 200, description = "Converted amounts", body = ConvertResponse),
        (status = 422, description = "Unknown currency or invalid amounts", body = ErrorResponse),
        (status = 503, description = "Rates unavailable", body = ErrorResponse)
    )
)]
async fn convert() {}

/// OpenAPI documentation for the Exchange API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Currency Exchange Gateway API",
        version = "1.0.0",
        description = "Currency list, exchange rates and amount conversion backed by Open Exchange Rates.\n\n## Authentication\n\nEvery `/v1` request is signed. Send the current UTC time and the lowercase hex HMAC-SHA256 of the API name followed by that time, keyed with the shared secret:\n\n```\nX-API-Date: 2024-01-01 12:00:00\nX-API-Key: hex(hmac_sha256(secret, api_name + date))\n```\n\nSignatures older or newer than the signature window (180 seconds by default) are rejected.",
        license(name = "MIT"),
    ),
    paths(health, list, rates, convert),
    components(
        schemas(
            HealthResponse,
            ListResponse,
            RatesResponse,
            ConvertRequest,
            ConvertResponse,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "currencies", description = "Currency list, rates and conversion"),
    )
)]
pub struct ApiDoc;

/// Security schemes for the signature headers.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_signature",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );
            components.add_security_scheme(
                "api_date",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Date"))),
            );
        }
    }
}
