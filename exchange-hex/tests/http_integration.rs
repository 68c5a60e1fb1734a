//! Integration tests for the HTTP surface.
//!
//! These drive the full middleware stack (diagnostics, signature check,
//! metrics, tracing) against an in-memory rate provider.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderValue, Method, Request, StatusCode},
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

use exchange_hex::{
    ExchangeService, RequestAuthenticator,
    inbound::{AppState, HealthCheck, HttpServer},
};
use exchange_types::{
    AgentStatus, CurrencyCode, CurrencyList, ProviderError, RateProvider, RateSet,
    format_api_date, security::sign_request,
};

const API_NAME: &str = "exchange";
const SECRET: &str = "integration-secret";

/// Provider with a fixed ISK rate table.
struct FixtureProvider {
    rate_calls: Arc<AtomicUsize>,
}

#[async_trait]
impl RateProvider for FixtureProvider {
    async fn currencies(&self) -> Result<CurrencyList, ProviderError> {
        Ok([("EUR", "Euro"), ("ISK", "Icelandic Króna"), ("USD", "United States Dollar")]
            .into_iter()
            .map(|(c, n)| (c.parse().unwrap(), n.to_string()))
            .collect())
    }

    async fn latest(
        &self,
        _base: &CurrencyCode,
        symbols: &[CurrencyCode],
    ) -> Result<RateSet, ProviderError> {
        self.rate_calls.fetch_add(1, Ordering::SeqCst);
        let rates: RateSet = [("EUR", 0.007955), ("ISK", 1.0), ("USD", 0.0072)]
            .into_iter()
            .map(|(c, r)| (c.parse().unwrap(), r))
            .collect();
        Ok(rates
            .into_iter()
            .filter(|(c, _)| symbols.is_empty() || symbols.contains(c))
            .collect())
    }
}

struct StubAgent {
    alive: AtomicBool,
}

#[async_trait]
impl AgentStatus for StubAgent {
    async fn agent_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn endpoint(&self) -> &str {
        "http://10.0.0.5:8500"
    }
}

struct TestApp {
    router: axum::Router,
    rate_calls: Arc<AtomicUsize>,
}

fn build_app(authenticator: RequestAuthenticator, debug: bool, health: HealthCheck) -> TestApp {
    let rate_calls = Arc::new(AtomicUsize::new(0));
    let provider = FixtureProvider {
        rate_calls: rate_calls.clone(),
    };
    let state = AppState::new(ExchangeService::new(provider), authenticator)
        .with_debug(debug)
        .with_health(health);
    TestApp {
        router: HttpServer::new(state).router(),
        rate_calls,
    }
}

fn configured() -> RequestAuthenticator {
    RequestAuthenticator::new(Some(API_NAME.into()), Some(SECRET.into()))
}

fn app() -> TestApp {
    build_app(configured(), false, HealthCheck::default())
}

/// Request signed with the current time.
fn signed(method: Method, uri: &str) -> axum::http::request::Builder {
    let date = format_api_date(Utc::now());
    Request::builder()
        .method(method)
        .uri(uri)
        .header("X-API-Date", &date)
        .header("X-API-Key", sign_request(SECRET.as_bytes(), API_NAME, &date))
}

fn get_signed(uri: &str) -> Request<Body> {
    signed(Method::GET, uri).body(Body::empty()).unwrap()
}

async fn send(router: axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

// ─────────────────────────────────────────────────────────────────────────────
// Health & docs
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_ok_without_signature() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, json) = send(app().router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "OK");
    assert_eq!(json["agent"], false);
    assert_eq!(json["agent_on"], false);
    assert_eq!(json["time"].as_str().unwrap().len(), 19);
}

#[tokio::test]
async fn test_health_unavailable_without_credentials() {
    let app = build_app(
        RequestAuthenticator::new(Some(API_NAME.into()), None),
        false,
        HealthCheck::default(),
    );
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, json) = send(app.router, request).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "Unavailable");
}

#[tokio::test]
async fn test_health_reports_agent() {
    let agent = Arc::new(StubAgent {
        alive: AtomicBool::new(false),
    });
    let health = HealthCheck {
        agent_on: true,
        agent: Some(agent.clone()),
        agent_addr: agent.endpoint().to_string(),
    };
    let app = build_app(configured(), false, health);

    let request = || Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, json) = send(app.router.clone(), request()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["agent_addr"], "http://10.0.0.5:8500");

    agent.alive.store(true, Ordering::SeqCst);
    let (status, json) = send(app.router, request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["agent"], true);
}

#[tokio::test]
async fn test_openapi_document_is_public() {
    let request = Request::builder()
        .uri("/openapi.json")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app().router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/v1/list"].is_object());
}

// ─────────────────────────────────────────────────────────────────────────────
// Authentication
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_signature_is_rejected() {
    let request = Request::builder()
        .uri("/v1/list")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app().router, request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["status"], "error");
    assert_eq!(json["message"], "Signature mismatch");
    assert!(json["file"].is_string());
    assert!(json["line"].is_u64());
    assert!(json.get("exception").is_none());
}

#[tokio::test]
async fn test_expired_signature() {
    let date = format_api_date(Utc::now() - Duration::seconds(600));
    let request = Request::builder()
        .uri("/v1/list")
        .header("X-API-Date", &date)
        .header("X-API-Key", sign_request(SECRET.as_bytes(), API_NAME, &date))
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app().router, request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["message"], "API signature has timed out");
}

#[tokio::test]
async fn test_malformed_date() {
    let date = "01/02/2024 10:00";
    let request = Request::builder()
        .uri("/v1/list")
        .header("X-API-Date", date)
        .header("X-API-Key", sign_request(SECRET.as_bytes(), API_NAME, date))
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app().router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["message"],
        "Received an invalid header while trying to authenticate user"
    );
}

#[tokio::test]
async fn test_non_ascii_date_is_malformed() {
    // Signed over the server clock, which a missing date would fall back to.
    let now = format_api_date(Utc::now());
    let request = Request::builder()
        .uri("/v1/list")
        .header("X-API-Date", HeaderValue::from_bytes(b"not-a-date \xe9").unwrap())
        .header("X-API-Key", sign_request(SECRET.as_bytes(), API_NAME, &now))
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app().router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["message"],
        "Received an invalid header while trying to authenticate user"
    );
}

#[tokio::test]
async fn test_non_ascii_date_is_not_reported_missing() {
    let app = build_app(
        configured().with_required_date(true),
        false,
        HealthCheck::default(),
    );
    let request = Request::builder()
        .uri("/v1/list")
        .header("X-API-Date", HeaderValue::from_bytes(b"\xe9").unwrap())
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_ne!(json["message"], "Missing X-API-Date header");
}

#[tokio::test]
async fn test_misconfigured_server() {
    let app = build_app(
        RequestAuthenticator::new(None, Some(SECRET.into())),
        false,
        HealthCheck::default(),
    );
    let (status, json) = send(app.router, get_signed("/v1/list")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["message"], "Internal server error");
}

#[tokio::test]
async fn test_debug_mode_reports_failures_as_headers() {
    let app = build_app(configured(), true, HealthCheck::default());
    let request = Request::builder()
        .uri("/v1/list")
        .header("X-API-Date", "2024-13-01 00:00:00")
        .header("X-API-Key", "forged")
        .body(Body::empty())
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert!(headers.contains_key("x-date-unexpected"));
    assert_eq!(headers["x-api-signature"], "Signature mismatch");
    assert!(!headers.contains_key("x-date-format"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Currency endpoints
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list() {
    let (status, json) = send(app().router, get_signed("/v1/list")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert_eq!(json["currencies"]["ISK"], "Icelandic Króna");
}

#[tokio::test]
async fn test_rates_with_symbols() {
    let (status, json) = send(
        app().router,
        get_signed("/v1/rates/ISK?symbols[]=EUR&symbols[]=USD"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["rates"],
        serde_json::json!({ "EUR": 0.007955, "USD": 0.0072 })
    );
}

#[tokio::test]
async fn test_rates_unknown_currency() {
    let app = app();
    let (status, json) = send(app.router, get_signed("/v1/rates/XYZ")).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json["message"],
        "ERROR: Getting exchange rates. Currency XYZ is invalid."
    );
    assert_eq!(app.rate_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_convert_from_query() {
    let (status, json) = send(
        app().router,
        get_signed("/v1/convert/ISK/EUR?amounts[]=3345&amounts[]=323274&amounts[]=7126"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        serde_json::json!({
            "status": "success",
            "base": "ISK",
            "currency": "EUR",
            "amounts": [26.61, 2571.64, 56.69]
        })
    );
}

#[tokio::test]
async fn test_convert_from_json_body() {
    let request = signed(Method::POST, "/v1/convert/ISK/ISK")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"amounts": [100, "2.5"]}"#))
        .unwrap();
    let (status, json) = send(app().router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["amounts"], serde_json::json!([100.0, 2.5]));
}

#[tokio::test]
async fn test_convert_from_form_body() {
    let request = signed(Method::POST, "/v1/convert/ISK/EUR")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("amounts[]=1000"))
        .unwrap();
    let (status, json) = send(app().router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["amounts"], serde_json::json!([7.96]));
}

#[tokio::test]
async fn test_convert_rejects_non_numeric_amounts() {
    let app = app();
    let (status, json) = send(
        app.router,
        get_signed("/v1/convert/ISK/EUR?amounts[]=12&amounts[]=twelve"),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json["message"],
        "ERROR: Converting amounts. Amounts must be numeric (eg. ?amounts[]=123&amounts[]=456)."
    );
    assert_eq!(app.rate_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_convert_without_amounts() {
    let (status, json) = send(app().router, get_signed("/v1/convert/ISK/EUR")).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        json["message"]
            .as_str()
            .unwrap()
            .contains("Must provide a list of amounts")
    );
}

#[tokio::test]
async fn test_debug_error_envelope() {
    let app = build_app(configured(), true, HealthCheck::default());
    let (status, json) = send(app.router, get_signed("/v1/convert/ISK/XYZ?amounts[]=1")).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["exception"], "InvalidCurrency");
    assert_eq!(
        json["extra_data"],
        serde_json::json!({ "baseCurrency": "ISK", "currency": "XYZ" })
    );
    assert_eq!(json["request_url"], "/v1/convert/ISK/XYZ?amounts[]=1");
    assert!(json["request_headers"]["x-api-key"].is_array());
    assert!(json["stacktrace"].is_array());
    assert!(json["file"].as_str().unwrap().ends_with("service.rs"));
}
