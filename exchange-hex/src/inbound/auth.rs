//! Signature middleware for the `/v1` API.

use std::borrow::Cow;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use exchange_types::{DATE_HEADER, RateProvider, SIGNATURE_HEADER};

use super::handlers::{ApiError, AppState};

/// Paths served without a signature.
const PUBLIC_PATHS: &[&str] = &["/", "/openapi.json"];

/// A present header is always passed on; bytes that are not visible ASCII
/// are replaced so the value still fails the date shape check.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<Cow<'a, str>> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()))
}

/// Authentication middleware that validates request signatures.
///
/// In production the first failed check short-circuits with the error
/// envelope. In debug mode the request always proceeds and every failed
/// check is reported as a response header instead.
pub async fn auth_middleware<P: RateProvider>(
    State(state): State<Arc<AppState<P>>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if PUBLIC_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let failures = {
        let headers = request.headers();
        state.authenticator.inspect(
            header_str(headers, SIGNATURE_HEADER).as_deref(),
            header_str(headers, DATE_HEADER).as_deref(),
            Utc::now(),
        )
    };

    if !state.debug {
        return match failures.into_iter().next() {
            Some(failure) => {
                tracing::warn!(path = %request.uri().path(), error = %failure, "Request signature rejected");
                ApiError::from(failure).into_response()
            }
            None => next.run(request).await,
        };
    }

    let mut response = next.run(request).await;
    for failure in &failures {
        tracing::debug!(error = %failure, "Signature check failed (diagnostic mode)");
        let name = HeaderName::from_bytes(failure.diagnostic_header().as_bytes());
        let value = HeaderValue::from_str(&failure.diagnostic_detail());
        if let (Ok(name), Ok(value)) = (name, value) {
            response.headers_mut().insert(name, value);
        }
    }
    response
}
