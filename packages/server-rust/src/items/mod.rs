//! The items resource: a minimal tenant-stamped CRUD example.

pub mod handlers;
pub mod schemas;
pub mod service;

use std::sync::Arc;

use axum::extract::FromRef;
use axum::routing::{get, post};
use axum::Router;

pub use schemas::{ItemCreate, ItemResponse};
pub use service::ItemService;

/// Routes mounted under `/api/v1`.
pub fn routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    Arc<ItemService>: FromRef<S>,
{
    Router::new()
        .route("/items", post(handlers::create_item))
        .route("/items/{id}", get(handlers::get_item))
}
