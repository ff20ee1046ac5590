use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({"message": "pong"}))]
pub struct PingResponse {
    #[schema(value_type = String)]
    pub message: &'static str,
}

/// Connectivity check under the versioned prefix.
#[utoipa::path(
    get,
    path = "/api/v1/ping",
    tag = "Ping",
    responses(
        (status = 200, description = "Service reachable", body = PingResponse)
    )
)]
pub async fn ping_handler() -> Json<PingResponse> {
    Json(PingResponse { message: "pong" })
}
