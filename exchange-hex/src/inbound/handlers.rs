//! HTTP request handlers.

use std::error::Error as _;
use std::panic::Location;
use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;

use exchange_types::{
    AgentStatus, AppError, AuthError, ConvertResponse, CurrencyError, ErrorResponse,
    HealthResponse, ListResponse, RateProvider, RatesResponse, format_api_date,
};

use super::params::{body_amounts, list_param};
use crate::{ExchangeService, RequestAuthenticator};

/// Discovery-agent settings reported by the health check.
#[derive(Clone, Default)]
pub struct HealthCheck {
    /// Whether the agent is expected to be running.
    pub agent_on: bool,
    pub agent: Option<Arc<dyn AgentStatus>>,
    pub agent_addr: String,
}

/// Application state shared across handlers.
pub struct AppState<P: RateProvider> {
    pub service: ExchangeService<P>,
    pub authenticator: RequestAuthenticator,
    /// Diagnostic mode: auth failures become response headers and error
    /// envelopes carry request details.
    pub debug: bool,
    pub health: HealthCheck,
}

impl<P: RateProvider> AppState<P> {
    pub fn new(service: ExchangeService<P>, authenticator: RequestAuthenticator) -> Self {
        Self {
            service,
            authenticator,
            debug: false,
            health: HealthCheck::default(),
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_health(mut self, health: HealthCheck) -> Self {
        self.health = health;
        self
    }
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
///
/// Remembers where it was raised; currency errors carry their own origin.
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    location: &'static Location<'static>,
}

impl ApiError {
    pub fn error(&self) -> &AppError {
        &self.error
    }
}

impl From<AppError> for ApiError {
    #[track_caller]
    fn from(error: AppError) -> Self {
        let location = match &error {
            AppError::Currency(e) => e.location,
            _ => Location::caller(),
        };
        ApiError { error, location }
    }
}

impl From<CurrencyError> for ApiError {
    fn from(err: CurrencyError) -> Self {
        let location = err.location;
        ApiError {
            error: AppError::Currency(err),
            location,
        }
    }
}

impl From<AuthError> for ApiError {
    #[track_caller]
    fn from(err: AuthError) -> Self {
        ApiError {
            error: AppError::Auth(err),
            location: Location::caller(),
        }
    }
}

/// Debug-only detail attached to error responses as an extension and
/// merged into the envelope by the diagnostics middleware.
#[derive(Debug, Clone)]
pub(crate) struct ErrorDiagnostics {
    pub exception: &'static str,
    pub extra_data: Option<serde_json::Value>,
    pub stacktrace: Vec<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %self.error, "Request failed");
        } else {
            tracing::warn!(error = %self.error, "Request rejected");
        }

        let mut body = ErrorResponse::new(self.error.to_string());
        body.file = Some(self.location.file().to_string());
        body.line = Some(self.location.line());

        let extra_data = match &self.error {
            AppError::Currency(e) => serde_json::to_value(&e.context).ok(),
            AppError::Auth(e) => Some(serde_json::json!({ "detail": e.diagnostic_detail() })),
            _ => None,
        };

        let mut stacktrace = vec![format!("{}:{}", self.location.file(), self.location.line())];
        let mut source = self.error.source();
        while let Some(cause) = source {
            stacktrace.push(cause.to_string());
            source = cause.source();
        }

        let diagnostics = ErrorDiagnostics {
            exception: self.error.kind_name(),
            extra_data,
            stacktrace,
        };

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(diagnostics);
        response
    }
}

/// Health check endpoint. Unauthenticated.
///
/// Reports 503 when the signing credentials are missing or the discovery
/// agent is expected but unreachable.
#[tracing::instrument(skip(state))]
pub async fn health<P: RateProvider>(
    State(state): State<Arc<AppState<P>>>,
) -> (StatusCode, Json<HealthResponse>) {
    let health = &state.health;
    let agent = match &health.agent {
        Some(agent) => agent.agent_alive().await,
        None => false,
    };

    let available = state.authenticator.is_configured() && (!health.agent_on || agent);
    let (code, status) = if available {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Unavailable")
    };

    (
        code,
        Json(HealthResponse {
            status: status.into(),
            time: format_api_date(Utc::now()),
            agent,
            agent_on: health.agent_on,
            agent_addr: health.agent_addr.clone(),
        }),
    )
}

/// OpenAPI document.
pub async fn openapi() -> impl IntoResponse {
    use utoipa::OpenApi;
    Json(crate::openapi::ApiDoc::openapi())
}

/// List supported currencies.
#[tracing::instrument(skip(state))]
pub async fn list<P: RateProvider>(
    State(state): State<Arc<AppState<P>>>,
) -> Result<Json<ListResponse>, ApiError> {
    let currencies = state.service.list().await?;
    Ok(Json(ListResponse::new(currencies.as_ref().clone())))
}

/// Exchange rates for a base currency.
#[tracing::instrument(skip(state, query))]
pub async fn rates<P: RateProvider>(
    State(state): State<Arc<AppState<P>>>,
    Path(currency): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Json<RatesResponse>, ApiError> {
    let symbols = list_param(query.as_deref(), "symbols");
    let rates = state.service.rates(&currency, &symbols).await?;
    Ok(Json(RatesResponse::new(rates.as_ref().clone())))
}

/// Convert amounts from `base` into `currency`.
///
/// Amounts come from the query string, or from a JSON / form body when the
/// query has none.
#[tracing::instrument(skip(state, query, headers, body))]
pub async fn convert<P: RateProvider>(
    State(state): State<Arc<AppState<P>>>,
    Path((base, currency)): Path<(String, String)>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ConvertResponse>, ApiError> {
    let mut amounts = list_param(query.as_deref(), "amounts");
    if amounts.is_empty() {
        amounts = body_amounts(&headers, &body)?;
    }

    let converted = state.service.convert(&base, &currency, &amounts).await?;
    Ok(Json(ConvertResponse::new(base, currency, converted)))
}
