//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The application layer depends on these traits, not concrete implementations.

mod agent;
mod key_value;
mod rate_provider;

pub use agent::AgentStatus;
pub use key_value::KeyValueStore;
pub use rate_provider::RateProvider;
