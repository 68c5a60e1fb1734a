//! Time-windowed HMAC request authentication.

use chrono::{DateTime, Utc};

use exchange_types::{
    AuthError, Secret, SignatureContext, format_api_date, is_api_date_shape, parse_api_date,
    security::verify_signature,
};

/// Default signature window in seconds.
pub const DEFAULT_SIGNATURE_TIMEOUT: i64 = 180;

const INVALID_HEADER: &str = "Received an invalid header while trying to authenticate user";
const MISSING_DATE: &str = "Missing X-API-Date header";
const MISCONFIGURED: &str = "API_SECRET or API_NAME not set";

/// Verifies `X-API-Key` / `X-API-Date` pairs against the shared secret.
///
/// The signature is `hex(HMAC-SHA256(secret, api_name || date))` and the
/// date must lie within `timeout` seconds of the server clock.
#[derive(Debug, Clone)]
pub struct RequestAuthenticator {
    api_name: Option<String>,
    secret: Option<Secret>,
    timeout_secs: i64,
    require_date: bool,
}

impl RequestAuthenticator {
    pub fn new(api_name: Option<String>, secret: Option<Secret>) -> Self {
        Self {
            api_name: api_name.filter(|name| !name.is_empty()),
            secret: secret.filter(|secret| !secret.is_empty()),
            timeout_secs: DEFAULT_SIGNATURE_TIMEOUT,
            require_date: false,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: i64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Rejects requests without `X-API-Date` instead of signing against
    /// the server clock.
    pub fn with_required_date(mut self, required: bool) -> Self {
        self.require_date = required;
        self
    }

    pub fn timeout_secs(&self) -> i64 {
        self.timeout_secs
    }

    /// Whether both the API name and the shared secret are set.
    pub fn is_configured(&self) -> bool {
        self.api_name.is_some() && self.secret.is_some()
    }

    /// Runs every check and returns all failures in check order.
    ///
    /// An empty result means the request is authentic.
    pub fn inspect(
        &self,
        signature: Option<&str>,
        date: Option<&str>,
        now: DateTime<Utc>,
    ) -> Vec<AuthError> {
        let mut failures = Vec::new();

        let date = match date {
            Some(date) => Some(date.to_string()),
            None if self.require_date => {
                failures.push(AuthError::InvalidRequestFormat(MISSING_DATE.into()));
                None
            }
            None => Some(format_api_date(now)),
        };

        if let Some(date) = &date {
            if !is_api_date_shape(date) {
                failures.push(AuthError::InvalidRequestFormat(INVALID_HEADER.into()));
            }

            match parse_api_date(date) {
                Some(instant) => {
                    let skew_seconds = (now - instant).num_seconds().abs();
                    if skew_seconds > self.timeout_secs {
                        failures.push(AuthError::SignatureExpired {
                            skew_seconds,
                            timeout_seconds: self.timeout_secs,
                        });
                    }
                }
                None => failures.push(AuthError::UnexpectedDate(date.clone())),
            }
        }

        let (Some(api_name), Some(secret)) = (&self.api_name, &self.secret) else {
            failures.push(AuthError::ServerMisconfigured(MISCONFIGURED.into()));
            return failures;
        };

        let provided = signature.unwrap_or_default();
        let date = date.unwrap_or_default();
        if !verify_signature(secret.expose(), api_name, &date, provided) {
            failures.push(AuthError::SignatureMismatch);
        }

        failures
    }

    /// Stops at the first failure.
    pub fn verify(
        &self,
        signature: Option<&str>,
        date: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<SignatureContext, AuthError> {
        if let Some(first) = self.inspect(signature, date, now).into_iter().next() {
            return Err(first);
        }

        Ok(SignatureContext {
            api_name: self.api_name.clone().unwrap_or_default(),
            date: date.map_or_else(|| format_api_date(now), str::to_string),
            provided_signature: signature.unwrap_or_default().to_string(),
        })
    }
}
