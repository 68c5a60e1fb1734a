//! Debug-mode enrichment of error envelopes with the failing request.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use exchange_types::{AppError, ErrorResponse, RateProvider};

use super::handlers::{ApiError, AppState, ErrorDiagnostics};

/// Largest request body echoed back in diagnostic mode.
const MAX_ECHO_BODY: usize = 64 * 1024;

fn header_lists(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        out.entry(name.to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    out
}

/// Adds exception name, extra data, stack and a request echo to error
/// envelopes. A no-op unless the server runs in debug mode.
pub async fn diagnostics_middleware<P: RateProvider>(
    State(state): State<Arc<AppState<P>>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.debug {
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_ECHO_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return ApiError::from(AppError::BadRequest(format!(
                "Request body could not be read: {}",
                e
            )))
            .into_response();
        }
    };

    let request_url = parts.uri.to_string();
    let request_headers = header_lists(&parts.headers);
    let request_body = String::from_utf8_lossy(&bytes).into_owned();

    let response = next.run(Request::from_parts(parts, Body::from(bytes))).await;

    let Some(diagnostics) = response.extensions().get::<ErrorDiagnostics>().cloned() else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let Ok(bytes) = to_bytes(body, usize::MAX).await else {
        return Response::from_parts(parts, Body::empty());
    };
    let Ok(mut envelope) = serde_json::from_slice::<ErrorResponse>(&bytes) else {
        return Response::from_parts(parts, Body::from(bytes));
    };

    envelope.exception = Some(diagnostics.exception.to_string());
    envelope.extra_data = diagnostics.extra_data;
    envelope.stacktrace = Some(diagnostics.stacktrace);
    envelope.request_url = Some(request_url);
    envelope.request_body = Some(request_body);
    envelope.request_headers = Some(request_headers);

    match serde_json::to_vec(&envelope) {
        Ok(enriched) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(enriched))
        }
        Err(_) => Response::from_parts(parts, Body::from(bytes)),
    }
}
