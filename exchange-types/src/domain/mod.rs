//! Domain models for the exchange gateway.

pub mod currency;
pub mod secret;
pub mod signature;

pub use currency::{CurrencyCode, CurrencyList, RateKey, RateSet};
pub use secret::Secret;
pub use signature::{
    API_DATE_FORMAT, DATE_HEADER, SIGNATURE_HEADER, SignatureContext, format_api_date,
    is_api_date_shape, parse_api_date,
};
