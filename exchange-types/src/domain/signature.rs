//! Signed request headers and the API date format.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Header carrying the hex HMAC signature.
pub const SIGNATURE_HEADER: &str = "X-API-Key";

/// Header carrying the signed date.
pub const DATE_HEADER: &str = "X-API-Date";

/// `chrono` format of the signed date, always UTC.
pub const API_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Inputs of one signature check. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureContext {
    pub api_name: String,
    pub date: String,
    pub provided_signature: String,
}

/// Formats an instant the way clients must send it in [`DATE_HEADER`].
pub fn format_api_date(instant: DateTime<Utc>) -> String {
    instant.format(API_DATE_FORMAT).to_string()
}

/// Checks the `YYYY-MM-DD HH:MM:SS` shape only (digits and separators).
///
/// `2024-13-01 00:00:00` passes; calendar validity is left to
/// [`parse_api_date`].
pub fn is_api_date_shape(date: &str) -> bool {
    const SHAPE: &[u8] = b"dddd-dd-dd dd:dd:dd";
    let bytes = date.as_bytes();
    bytes.len() == SHAPE.len()
        && bytes.iter().zip(SHAPE).all(|(&b, &s)| match s {
            b'd' => b.is_ascii_digit(),
            sep => b == sep,
        })
}

/// Parses a shape-valid date as a UTC instant.
pub fn parse_api_date(date: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(date, API_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
