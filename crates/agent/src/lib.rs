//! Surge agent service
//!
//! Serves the surge engine over HTTP together with health, readiness and
//! Prometheus metrics endpoints.

pub mod api;
pub mod config;

pub use api::{create_router, serve, AppState};
pub use config::AgentConfig;
