//! Request timeout middleware.
//!
//! Requests whose handler runs past the configured limit are cancelled and
//! answered with a 408 error envelope carrying the current request ID.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::response::{IntoResponse, Response};
use http::{Request, StatusCode};
use tower::{Layer, Service};

use crate::error::ApiError;

// ---------------------------------------------------------------------------
// RequestTimeoutLayer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct RequestTimeoutLayer {
    timeout: Duration,
}

impl RequestTimeoutLayer {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl<S> Layer<S> for RequestTimeoutLayer {
    type Service = RequestTimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestTimeoutService {
            inner,
            timeout: self.timeout,
        }
    }
}

// ---------------------------------------------------------------------------
// RequestTimeoutService
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RequestTimeoutService<S> {
    inner: S,
    timeout: Duration,
}

impl<S, ReqBody> Service<Request<ReqBody>> for RequestTimeoutService<S>
where
    S: Service<Request<ReqBody>, Response = Response> + Send,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let timeout = self.timeout;
        let fut = self.inner.call(req);
        Box::pin(async move {
            match tokio::time::timeout(timeout, fut).await {
                Ok(result) => result,
                Err(_elapsed) => Ok(ApiError::http(
                    StatusCode::REQUEST_TIMEOUT,
                    format!("Request exceeded {}s timeout", timeout.as_secs_f64()),
                )
                .into_response()),
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use axum::body::{to_bytes, Body};
    use stratum_core::{bind_logged, ErrorEnvelope, REQUEST_ID};
    use tower::ServiceExt;

    use super::*;

    /// Service that takes a configurable delay before responding.
    #[derive(Clone)]
    struct SlowService {
        delay: Duration,
    }

    impl Service<Request<Body>> for SlowService {
        type Response = Response;
        type Error = Infallible;
        type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _req: Request<Body>) -> Self::Future {
            let delay = self.delay;
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                Ok("done".into_response())
            })
        }
    }

    #[tokio::test]
    async fn completes_within_timeout() {
        let svc = RequestTimeoutLayer::new(Duration::from_secs(1)).layer(SlowService {
            delay: Duration::from_millis(10),
        });
        let response = svc.oneshot(Request::new(Body::empty())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn exceeds_timeout_returns_408_envelope() {
        let svc = RequestTimeoutLayer::new(Duration::from_millis(50)).layer(SlowService {
            delay: Duration::from_millis(500),
        });
        let response = bind_logged(REQUEST_ID, "slow-1", svc.oneshot(Request::new(Body::empty())))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorEnvelope = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error.code, "HTTP_408");
        assert_eq!(body.error.request_id, "slow-1");
    }
}
