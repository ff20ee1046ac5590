//! Liveness and readiness probes, mounted at the root without a version prefix.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use super::AppState;
use crate::network::HealthState;

#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({"status": "ok"}))]
pub struct HealthResponse {
    /// `ok`, or the lifecycle state while not ready.
    #[schema(value_type = String)]
    pub status: &'static str,
}

/// Liveness probe -- always 200 while the process can answer at all.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Process is alive", body = HealthResponse)
    )
)]
pub async fn liveness_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Readiness probe -- 200 when ready, 503 with the current state otherwise.
///
/// Fails during startup and once shutdown has been signalled, so load
/// balancers stop routing new traffic before the listener closes.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Accepting traffic", body = HealthResponse),
        (status = 503, description = "Starting, draining or stopped", body = HealthResponse)
    )
)]
pub async fn readiness_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.shutdown.health_state() {
        HealthState::Ready => (StatusCode::OK, Json(HealthResponse { status: "ok" })),
        other => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: other.as_str(),
            }),
        ),
    }
}
