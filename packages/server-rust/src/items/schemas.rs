//! Request and response bodies for the items resource.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Body of `POST /api/v1/items`.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "Widget",
    "description": "A reusable widget component",
    "price": 9.99
}))]
pub struct ItemCreate {
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 1000, message = "must be at most 1000 characters"))]
    pub description: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "must be greater than 0"))]
    pub price: f64,
}

/// A stored item as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "550e8400-e29b-41d4-a716-446655440000",
    "name": "Widget",
    "description": "A reusable widget component",
    "price": 9.99,
    "tenant_id": "acme",
    "created_at": "2024-01-01T00:00:00Z"
}))]
pub struct ItemResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub tenant_id: String,
    pub created_at: DateTime<Utc>,
}
