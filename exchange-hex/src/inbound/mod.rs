//! HTTP Inbound Adapter
//!
//! Axum-based HTTP server that drives the application layer.

mod auth;
mod diagnostics;
mod handlers;
mod params;
mod server;

pub use handlers::{ApiError, AppState, HealthCheck};
pub use server::HttpServer;
