//! Handler definitions and the shared application state.

pub mod health;
pub mod ping;

pub use health::{liveness_handler, readiness_handler};
pub use ping::ping_handler;

use std::sync::Arc;

use axum::extract::FromRef;

use super::ShutdownController;
use crate::config::Settings;
use crate::items::ItemService;

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Holds `Arc` references to shared resources so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub items: Arc<ItemService>,
    /// Lifecycle state read by the readiness probe.
    pub shutdown: Arc<ShutdownController>,
    pub settings: Arc<Settings>,
}

impl AppState {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            items: Arc::new(ItemService::new()),
            shutdown: Arc::new(ShutdownController::new()),
            settings: Arc::new(settings),
        }
    }
}

impl FromRef<AppState> for Arc<ItemService> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.items)
    }
}
