//! Request-ID middleware.
//!
//! Accepts the caller's `X-Request-ID` verbatim when it is non-empty UTF-8,
//! otherwise assigns a fresh UUID v4. The ID is bound in the request context
//! (and the `request` log span) for the whole downstream call, stored as a
//! [`RequestId`] request extension, and echoed on the response.
//!
//! This replaces tower-http's `SetRequestId`/`PropagateRequestId` pair, which
//! cannot bind the ID into the context store around the inner call.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use http::header::HeaderName;
use http::{HeaderMap, HeaderValue, Request, Response};
use stratum_core::bind_logged;
use stratum_core::context::{self, generate_request_id, REQUEST_ID};
use tower::{Layer, Service};

/// Header carrying the request ID in both directions.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Request extension holding the ID assigned to the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Returns the caller-supplied request ID, byte for byte.
///
/// Empty values and values that are not valid UTF-8 are ignored.
#[must_use]
pub fn inbound_request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| std::str::from_utf8(value.as_bytes()).ok())
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// The request ID bound for the current request, if any.
#[must_use]
pub fn current_request_id() -> Option<String> {
    context::get(REQUEST_ID)
}

// ---------------------------------------------------------------------------
// RequestIdLayer
// ---------------------------------------------------------------------------

/// Tower layer that assigns and propagates request IDs.
#[derive(Debug, Clone, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

// ---------------------------------------------------------------------------
// RequestIdService
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequestIdService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response<ResBody>, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let request_id = inbound_request_id(req.headers()).unwrap_or_else(generate_request_id);
        let header_value = HeaderValue::from_str(&request_id).ok();
        req.extensions_mut().insert(RequestId(request_id.clone()));

        // Use the service that was driven to readiness; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(bind_logged(REQUEST_ID, request_id, async move {
            tracing::debug!(method = %req.method(), path = %req.uri().path(), "request started");
            let mut response = inner.call(req).await?;
            if let Some(value) = header_value {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            Ok(response)
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
