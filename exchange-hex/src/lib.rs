//! # Exchange Hex
//!
//! Application layer and HTTP adapter for the currency exchange gateway.
//!
//! ## Architecture
//!
//! - `cache` - refresh-ahead cache over a [`RateProvider`](exchange_types::RateProvider)
//! - `service` - application service (currency list, rates, conversion)
//! - `auth` - time-windowed HMAC request authentication
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! The service is generic over `P: RateProvider`, allowing different
//! upstream implementations to be injected.

pub mod auth;
pub mod cache;
pub mod inbound;
pub mod openapi;
pub mod service;


pub use auth::RequestAuthenticator;
pub use cache::{Clock, Lookup, RateCache, SystemClock};
pub use service::ExchangeService;
