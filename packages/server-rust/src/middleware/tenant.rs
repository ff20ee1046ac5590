//! Tenant resolution middleware.
//!
//! Reads `X-Tenant-ID` and binds it in the request context, falling back to
//! [`DEFAULT_TENANT`]. The value is an advisory label for logs and scoping,
//! not an authorization decision.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::extract::FromRequestParts;
use http::header::HeaderName;
use http::request::Parts;
use http::{HeaderMap, Request};
use stratum_core::bind_logged;
use stratum_core::context::{self, DEFAULT_TENANT, TENANT_ID};
use tower::{Layer, Service};

pub const TENANT_ID_HEADER: HeaderName = HeaderName::from_static("x-tenant-id");

/// Tenant named by the request headers, if any.
#[must_use]
pub fn inbound_tenant_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(&TENANT_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// Tenant bound for the current request, or the default tenant.
#[must_use]
pub fn current_tenant_id() -> String {
    context::get(TENANT_ID).unwrap_or_else(|| DEFAULT_TENANT.to_owned())
}

/// Handler extractor for the current tenant. Never rejects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant(pub String);

impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(_parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_tenant_id()))
    }
}

// ---------------------------------------------------------------------------
// TenantLayer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct TenantLayer;

impl<S> Layer<S> for TenantLayer {
    type Service = TenantService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TenantService { inner }
    }
}

// ---------------------------------------------------------------------------
// TenantService
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TenantService<S> {
    inner: S,
}

impl<S, ReqBody> Service<Request<ReqBody>> for TenantService<S>
where
    S: Service<Request<ReqBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<S::Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let (tenant_id, source) = match inbound_tenant_id(req.headers()) {
            Some(tenant_id) => (tenant_id, "header"),
            None => (DEFAULT_TENANT.to_owned(), "default"),
        };

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(bind_logged(TENANT_ID, tenant_id, async move {
            tracing::debug!(source, "tenant resolved");
            inner.call(req).await
        }))
    }
}
