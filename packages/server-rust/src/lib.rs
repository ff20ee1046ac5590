//! Stratum Server: multi-tenant HTTP API with request-scoped context, structured
//! logging bindings, and uniform JSON error envelopes.

pub mod config;
pub mod error;
pub mod extract;
pub mod items;
pub mod middleware;
pub mod network;
pub mod telemetry;

pub use config::{Environment, Settings};
pub use error::ApiError;
pub use network::{build_router, AppState, NetworkModule};
