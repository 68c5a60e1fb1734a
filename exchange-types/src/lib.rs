//! # Exchange Types
//!
//! Domain types and port traits for the currency exchange gateway.
//! This crate has ZERO external IO dependencies - only data structures,
//! signing rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (currency list, rate set, secret, signature)
//! - `ports/` - Trait definitions that adapters must implement
//! - `security` - HMAC request signing shared by server and client
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Auth, upstream, currency and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;
pub mod security;

// Re-export commonly used types
pub use domain::{
    API_DATE_FORMAT, CurrencyCode, CurrencyList, DATE_HEADER, RateKey, RateSet, SIGNATURE_HEADER,
    Secret, SignatureContext, format_api_date, is_api_date_shape, parse_api_date,
};
pub use dto::*;
pub use error::{
    AppError, AuthError, CurrencyContext, CurrencyError, CurrencyErrorKind, ProviderError,
    SecretError,
};
pub use ports::{AgentStatus, KeyValueStore, RateProvider};
