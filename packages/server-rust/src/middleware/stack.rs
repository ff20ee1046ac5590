//! The request pipeline applied to every route, including the fallback.
//!
//! Ordering follows the outer-to-inner convention: the first layer listed is
//! the outermost (sees the request first and the response last).

use std::any::Any;
use std::time::Duration;

use axum::response::Response;
use axum::Router;
use tower::layer::util::{Identity, Stack};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::request_id::RequestIdLayer;
use super::tenant::TenantLayer;
use super::timeout::RequestTimeoutLayer;
use crate::error::panic_response;

type PanicHandler = fn(Box<dyn Any + Send + 'static>) -> Response;

/// The composed layer produced by [`request_layers`].
pub type RequestLayers = Stack<
    RequestTimeoutLayer,
    Stack<
        CatchPanicLayer<PanicHandler>,
        Stack<
            TraceLayer<SharedClassifier<ServerErrorsAsFailures>>,
            Stack<TenantLayer, Stack<RequestIdLayer, Identity>>,
        >,
    >,
>;

/// Builds the request pipeline.
///
/// **Middleware ordering (outermost to innermost):**
/// 1. `RequestId` -- accepts or assigns `X-Request-ID` and binds it
/// 2. `Tenant` -- resolves `X-Tenant-ID` and binds it
/// 3. `Trace` -- access log span per request, inside both bindings
/// 4. `CatchPanic` -- turns handler panics into the 500 envelope
/// 5. `Timeout` -- cancels slow handlers with the 408 envelope
///
/// The panic and timeout responses are built while both bindings are still
/// active, so their envelopes carry the request's own ID.
#[must_use]
pub fn request_layers(request_timeout: Duration) -> RequestLayers {
    ServiceBuilder::new()
        .layer(RequestIdLayer)
        .layer(TenantLayer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CatchPanicLayer::custom(panic_response as PanicHandler))
        .layer(RequestTimeoutLayer::new(request_timeout))
        .into_inner()
}

/// Wraps every route of `router` (and its fallback) in the request pipeline.
pub fn with_request_pipeline<S>(router: Router<S>, request_timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(request_layers(request_timeout))
}
