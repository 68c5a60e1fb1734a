//! Error types for the exchange gateway.

use std::panic::Location;

use serde::Serialize;

/// Request authentication failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidRequestFormat(String),

    /// The date has the right shape but is not a real calendar instant.
    #[error("Failed to parse date ({0})")]
    UnexpectedDate(String),

    #[error("API signature has timed out")]
    SignatureExpired {
        skew_seconds: i64,
        timeout_seconds: i64,
    },

    #[error("Internal server error")]
    ServerMisconfigured(String),

    #[error("Signature mismatch")]
    SignatureMismatch,
}

impl AuthError {
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InvalidRequestFormat(_) | AuthError::UnexpectedDate(_) => 400,
            AuthError::SignatureExpired { .. } | AuthError::SignatureMismatch => 403,
            AuthError::ServerMisconfigured(_) => 500,
        }
    }

    /// Response header used to annotate this failure in diagnostic mode.
    pub fn diagnostic_header(&self) -> &'static str {
        match self {
            AuthError::InvalidRequestFormat(_) => "X-Date-Format",
            AuthError::UnexpectedDate(_) => "X-Date-Unexpected",
            AuthError::SignatureExpired { .. } => "X-Date-Timeout",
            AuthError::ServerMisconfigured(_) => "X-Api-Secret",
            AuthError::SignatureMismatch => "X-Api-Signature",
        }
    }

    /// Detail for the diagnostic header; misconfiguration reveals its cause here only.
    pub fn diagnostic_detail(&self) -> String {
        match self {
            AuthError::ServerMisconfigured(detail) => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// Key/value store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SecretError {
    #[error("Key/value store unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Key not found: {0}")]
    NotFound(String),
}

/// Upstream rate provider failures. Absorbed by the rate cache.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider credentials unavailable: {0}")]
    Credentials(#[from] SecretError),

    #[error("Provider unreachable: {0}")]
    Transport(String),

    #[error("Provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Provider response is invalid: {0}")]
    InvalidResponse(String),
}

/// Kind of a currency domain error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CurrencyErrorKind {
    InvalidCurrency,
    InvalidAmounts,
    EmptyUpstreamResponse,
}

impl CurrencyErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            CurrencyErrorKind::InvalidCurrency | CurrencyErrorKind::InvalidAmounts => 422,
            CurrencyErrorKind::EmptyUpstreamResponse => 503,
        }
    }
}

/// Structured context attached to a currency error for observability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CurrencyContext {
    #[serde(rename = "baseCurrency", skip_serializing_if = "Option::is_none")]
    pub base_currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbols: Option<Vec<String>>,
}

/// The one generic currency error surfaced to callers.
///
/// Records where it was raised so the error envelope can report it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("ERROR: {message}")]
pub struct CurrencyError {
    pub kind: CurrencyErrorKind,
    pub message: String,
    pub context: CurrencyContext,
    pub location: &'static Location<'static>,
}

impl CurrencyError {
    #[track_caller]
    pub fn new(kind: CurrencyErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: CurrencyContext::default(),
            location: Location::caller(),
        }
    }

    #[track_caller]
    pub fn invalid_currency(message: impl Into<String>) -> Self {
        Self::new(CurrencyErrorKind::InvalidCurrency, message)
    }

    #[track_caller]
    pub fn invalid_amounts(message: impl Into<String>) -> Self {
        Self::new(CurrencyErrorKind::InvalidAmounts, message)
    }

    #[track_caller]
    pub fn empty_response(message: impl Into<String>) -> Self {
        Self::new(CurrencyErrorKind::EmptyUpstreamResponse, message)
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.context.base_currency = Some(base.into());
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.context.currency = Some(currency.into());
        self
    }

    pub fn with_symbols(mut self, symbols: Vec<String>) -> Self {
        self.context.symbols = Some(symbols);
        self
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Currency(#[from] CurrencyError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Auth(e) => e.status_code(),
            AppError::Currency(e) => e.status_code(),
            AppError::BadRequest(_) => 400,
        }
    }

    /// Stable name of the failure kind, reported in diagnostic mode.
    pub fn kind_name(&self) -> &'static str {
        match self {
            AppError::Auth(AuthError::InvalidRequestFormat(_) | AuthError::UnexpectedDate(_)) => {
                "InvalidRequestFormat"
            }
            AppError::Auth(AuthError::SignatureExpired { .. }) => "SignatureExpired",
            AppError::Auth(AuthError::ServerMisconfigured(_)) => "ServerMisconfigured",
            AppError::Auth(AuthError::SignatureMismatch) => "SignatureMismatch",
            AppError::Currency(e) => match e.kind {
                CurrencyErrorKind::InvalidCurrency => "InvalidCurrency",
                CurrencyErrorKind::InvalidAmounts => "InvalidAmounts",
                CurrencyErrorKind::EmptyUpstreamResponse => "EmptyUpstreamResponse",
            },
            AppError::BadRequest(_) => "BadRequest",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_status_codes() {
        assert_eq!(AuthError::InvalidRequestFormat("x".into()).status_code(), 400);
        assert_eq!(AuthError::UnexpectedDate("x".into()).status_code(), 400);
        assert_eq!(
            AuthError::SignatureExpired {
                skew_seconds: 181,
                timeout_seconds: 180
            }
            .status_code(),
            403
        );
        assert_eq!(AuthError::SignatureMismatch.status_code(), 403);
        assert_eq!(AuthError::ServerMisconfigured("x".into()).status_code(), 500);
    }

    #[test]
    fn test_misconfiguration_hides_detail_from_message() {
        let err = AuthError::ServerMisconfigured("API_SECRET or API_NAME not set".into());
        assert_eq!(err.to_string(), "Internal server error");
        assert_eq!(err.diagnostic_detail(), "API_SECRET or API_NAME not set");
    }

    #[test]
    fn test_currency_error_records_call_site() {
        let line = line!() + 1;
        let err = CurrencyError::invalid_currency("Currency XYZ is invalid.");
        assert_eq!(err.location.line(), line);
        assert!(err.location.file().ends_with("error.rs"));
        assert_eq!(err.to_string(), "ERROR: Currency XYZ is invalid.");
    }

    #[test]
    fn test_currency_context_serialization() {
        let err = CurrencyError::invalid_currency("bad")
            .with_base("ISK")
            .with_symbols(vec!["EUR".into()]);
        let json = serde_json::to_value(&err.context).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "baseCurrency": "ISK", "symbols": ["EUR"] })
        );
    }

    #[test]
    fn test_app_error_mapping() {
        let err: AppError = CurrencyError::empty_response("Response is invalid.").into();
        assert_eq!(err.status_code(), 503);
        assert_eq!(err.kind_name(), "EmptyUpstreamResponse");

        let err: AppError = AuthError::SignatureMismatch.into();
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.kind_name(), "SignatureMismatch");
    }
}
