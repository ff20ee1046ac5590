//! Network module with deferred startup lifecycle.
//!
//! `new()` creates shared state, `start()` binds the TCP listener, and
//! `serve()` starts accepting connections. Tests drive [`build_router`]
//! directly without binding a port.

use std::future::Future;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use super::handlers::{liveness_handler, ping_handler, readiness_handler, AppState};
use super::openapi::docs_routes;
use super::shutdown::ShutdownController;
use crate::config::Settings;
use crate::error;
use crate::items::{self, ItemService};
use crate::middleware::with_request_pipeline;

/// Assembles every route behind the request pipeline.
///
/// Routes:
/// - `GET /health` -- liveness probe
/// - `GET /ready` -- readiness probe
/// - `GET /api/v1/ping`
/// - `POST /api/v1/items`, `GET /api/v1/items/{id}`
/// - `GET /api/openapi.json`, `/api/docs/`, `/api/redoc`
///
/// Unknown paths reach the 404 fallback and known paths hit with the wrong
/// method reach the 405 fallback. Both run through the same pipeline.
pub fn build_router(state: AppState) -> Router {
    let api_v1 = Router::new()
        .route("/ping", get(ping_handler))
        .merge(items::routes());

    // The 405 fallback is attached to routes that exist when it is set.
    let router = Router::new()
        .route("/health", get(liveness_handler))
        .route("/ready", get(readiness_handler))
        .nest("/api/v1", api_v1)
        .merge(docs_routes(&state.settings))
        .fallback(error::not_found)
        .method_not_allowed_fallback(error::method_not_allowed);

    with_request_pipeline(router, state.settings.request_timeout()).with_state(state)
}

/// Manages the HTTP server lifecycle.
///
/// Follows the deferred startup pattern:
/// 1. `new()` -- allocates shared state (item store, shutdown controller)
/// 2. `start()` -- binds TCP listener to the configured address
/// 3. `serve()` -- begins accepting connections until shutdown is signalled
pub struct NetworkModule {
    listener: Option<TcpListener>,
    state: AppState,
}

impl NetworkModule {
    /// Creates a new network module without binding any port.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            listener: None,
            state: AppState::new(settings),
        }
    }

    #[must_use]
    pub fn items(&self) -> Arc<ItemService> {
        Arc::clone(&self.state.items)
    }

    /// Returns a shared reference to the shutdown controller.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.state.shutdown)
    }

    pub fn build_router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which may differ from the configured
    /// port when port 0 is used (OS-assigned ephemeral port).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let settings = &self.state.settings;
        let listener = TcpListener::bind(settings.bind_addr()).await?;
        let port = listener.local_addr()?.port();

        info!(host = %settings.host, port, "TCP listener bound");

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves connections until `shutdown` resolves, then drains.
    ///
    /// Health moves to Ready before the first connection is accepted, to
    /// Draining as soon as `shutdown` fires, and to Stopped once every
    /// in-flight request has completed.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called first, or if the server
    /// hits a fatal I/O error.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let Some(listener) = self.listener else {
            anyhow::bail!("start() must be called before serve()");
        };
        let controller = Arc::clone(&self.state.shutdown);
        let router = build_router(self.state);

        controller.set_ready();
        info!("serving HTTP connections");

        let draining = Arc::clone(&controller);
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                draining.trigger_shutdown();
                info!("draining in-flight requests");
            })
            .await?;

        controller.mark_stopped();
        info!("server stopped");
        Ok(())
    }
}
