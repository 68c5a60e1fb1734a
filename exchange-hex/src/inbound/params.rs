//! Array-style request parameters (`amounts[]=1&amounts[]=2`).

use axum::http::{HeaderMap, header};

use exchange_types::{AppError, ConvertRequest};

/// Values of `name`, `name[]` and `name[N]` in a url-encoded string, in order.
pub(crate) fn list_param(encoded: Option<&str>, name: &str) -> Vec<String> {
    let Some(encoded) = encoded else {
        return Vec::new();
    };

    url::form_urlencoded::parse(encoded.as_bytes())
        .filter(|(key, _)| matches_list_key(key, name))
        .map(|(_, value)| value.into_owned())
        .collect()
}

fn matches_list_key(key: &str, name: &str) -> bool {
    match key.strip_prefix(name) {
        Some("") | Some("[]") => true,
        Some(rest) => {
            rest.len() > 2
                && rest.starts_with('[')
                && rest.ends_with(']')
                && rest[1..rest.len() - 1].bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Amounts carried in a JSON or url-encoded request body.
pub(crate) fn body_amounts(headers: &HeaderMap, body: &[u8]) -> Result<Vec<String>, AppError> {
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("application/json") {
        let req: ConvertRequest = serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("Malformed JSON body: {}", e)))?;
        return Ok(req
            .amounts
            .into_iter()
            .map(|value| match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect());
    }

    let encoded = String::from_utf8_lossy(body);
    Ok(list_param(Some(&encoded), "amounts"))
}
