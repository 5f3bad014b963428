//! Stowage HTTP API
//!
//! This crate provides the Axum-based HTTP surface for Stowage: health and
//! Prometheus endpoints plus object routes backed by the storage facade.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppInfo, AppState, MetricsHandle};
