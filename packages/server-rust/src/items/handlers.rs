//! HTTP handlers for `/api/v1/items`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use stratum_core::ErrorEnvelope;
use uuid::Uuid;

use super::schemas::{ItemCreate, ItemResponse};
use super::service::ItemService;
use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::middleware::Tenant;

/// Creates an item stamped with the caller's tenant.
#[utoipa::path(
    post,
    path = "/api/v1/items",
    tag = "Items",
    params(
        ("X-Tenant-ID" = Option<String>, Header, description = "Tenant label, `public` when absent"),
        ("X-Request-ID" = Option<String>, Header, description = "Correlation ID, generated when absent")
    ),
    request_body = ItemCreate,
    responses(
        (status = 201, description = "Item created", body = ItemResponse),
        (status = 413, description = "Body over the size limit", body = ErrorEnvelope),
        (status = 422, description = "Malformed or invalid body", body = ErrorEnvelope)
    )
)]
pub async fn create_item(
    State(items): State<Arc<ItemService>>,
    Tenant(tenant_id): Tenant,
    ValidatedJson(payload): ValidatedJson<ItemCreate>,
) -> (StatusCode, Json<ItemResponse>) {
    let item = items.create(payload, &tenant_id);
    tracing::info!(item_id = %item.id, "item created");
    (StatusCode::CREATED, Json(item))
}

/// Fetches one item by ID.
#[utoipa::path(
    get,
    path = "/api/v1/items/{id}",
    tag = "Items",
    params(
        ("id" = String, Path, description = "Item ID (UUID)")
    ),
    responses(
        (status = 200, description = "The stored item", body = ItemResponse),
        (status = 404, description = "No item with this ID", body = ErrorEnvelope),
        (status = 422, description = "ID is not a UUID", body = ErrorEnvelope)
    )
)]
pub async fn get_item(
    State(items): State<Arc<ItemService>>,
    Path(id): Path<String>,
) -> Result<Json<ItemResponse>, ApiError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::validation(format!("id: '{id}' is not a valid UUID")))?;
    items
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Item {id} not found")))
}
