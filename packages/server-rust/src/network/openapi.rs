//! OpenAPI document and the interactive docs mounted beside the API.
//!
//! - `GET /api/openapi.json` -- the generated document
//! - `GET /api/docs/` -- Swagger UI
//! - `GET /api/redoc` -- ReDoc

use axum::Router;
use stratum_core::{ErrorBody, ErrorEnvelope};
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{health, ping};
use crate::config::Settings;
use crate::items::{handlers as items, ItemCreate, ItemResponse};

pub const OPENAPI_PATH: &str = "/api/openapi.json";
pub const SWAGGER_PATH: &str = "/api/docs";
pub const REDOC_PATH: &str = "/api/redoc";

#[derive(OpenApi)]
#[openapi(
    paths(
        health::liveness_handler,
        health::readiness_handler,
        ping::ping_handler,
        items::create_item,
        items::get_item,
    ),
    components(schemas(
        health::HealthResponse,
        ping::PingResponse,
        ItemCreate,
        ItemResponse,
        ErrorEnvelope,
        ErrorBody,
    )),
    tags(
        (name = "Health", description = "Liveness and readiness probes, served without a version prefix."),
        (name = "Ping", description = "Connectivity check."),
        (name = "Items", description = "Tenant-stamped example resource. Failures answer with the `ErrorEnvelope` body."),
    ),
    info(
        description = "Multi-tenant HTTP API. Every response carries `X-Request-ID`; send `X-Tenant-ID` to select a tenant."
    )
)]
pub struct ApiDoc;

/// The document for this deployment, titled with the configured app name.
#[must_use]
pub fn api_doc(settings: &Settings) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title.clone_from(&settings.app_name);
    doc
}

/// Routes serving the document, Swagger UI and ReDoc.
pub fn docs_routes<S>(settings: &Settings) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let doc = api_doc(settings);
    Router::new()
        .merge(SwaggerUi::new(SWAGGER_PATH).url(OPENAPI_PATH, doc.clone()))
        .merge(Redoc::with_url(REDOC_PATH, doc))
}
