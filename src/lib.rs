//! Dealer Dashboard Client
//!
//! Layered like the dashboard it serves:
//! - models: records, entity kinds and media payloads
//! - api: typed REST calls over a pluggable transport
//! - store: per-entity editing state and its network sequences
//! - context: one session's client and stores

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod query;
pub mod session;
pub mod settings;
pub mod store;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use context::DashboardContext;
pub use error::{ApiError, ApiResult, Outcome};
