//! Translation of every failure into the uniform JSON error envelope.
//!
//! Handlers return [`ApiError`]; extractors reject with it; panics are caught
//! by the pipeline and routed through [`panic_response`]. Each path logs once
//! with the current `request_id` and answers with an [`ErrorEnvelope`].

use std::any::Any;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use stratum_core::context::{self, generate_request_id, REQUEST_ID};
use stratum_core::{ErrorEnvelope, ErrorKind};
use tracing::{error, warn};

use crate::middleware::request_id::inbound_request_id;

/// Errors surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body or query failed schema validation.
    #[error("request validation failed: {message}")]
    Validation { message: String },
    /// Business logic rejected the request with an intended status.
    #[error("{status}: {message}")]
    Http { status: StatusCode, message: String },
    /// Anything else. Details are logged, never returned.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::http(StatusCode::NOT_FOUND, message)
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Http { status, .. } => ErrorKind::Application {
                status: status.as_u16(),
            },
            Self::Internal(_) => ErrorKind::Unexpected,
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Logs the error and renders the envelope.
    ///
    /// `headers` are the inbound request headers when the caller has them;
    /// they are consulted only if no request ID is bound in the context.
    #[must_use]
    pub fn into_response_with(self, headers: Option<&HeaderMap>) -> Response {
        let request_id = resolve_request_id(headers);
        let kind = self.kind();
        let status = self.status();

        let message = match &self {
            Self::Validation { message } => {
                warn!(request_id = %request_id, errors = %message, "validation error");
                message.clone()
            }
            Self::Http { status, message } => {
                warn!(
                    request_id = %request_id,
                    status_code = status.as_u16(),
                    detail = %message,
                    "http error"
                );
                message.clone()
            }
            Self::Internal(err) => {
                error!(request_id = %request_id, error = ?err, "unhandled error");
                String::new()
            }
        };

        let envelope = ErrorEnvelope::new(kind, message, request_id);
        (status, Json(envelope)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_response_with(None)
    }
}

/// Picks the request ID for an error envelope.
///
/// Order: the ID bound by the request-ID middleware, then the inbound
/// `x-request-id` header, then a freshly generated one.
#[must_use]
pub fn resolve_request_id(headers: Option<&HeaderMap>) -> String {
    context::get(REQUEST_ID)
        .or_else(|| headers.and_then(inbound_request_id))
        .unwrap_or_else(generate_request_id)
}

/// Response for a handler that panicked. Installed in the catch-panic layer.
#[allow(clippy::needless_pass_by_value)]
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned());
    ApiError::Internal(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}

/// Fallback for unrouted paths.
pub async fn not_found(headers: HeaderMap) -> Response {
    ApiError::not_found("Not Found").into_response_with(Some(&headers))
}

/// Fallback for a routed path hit with a method it does not serve.
pub async fn method_not_allowed(headers: HeaderMap) -> Response {
    ApiError::http(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
        .into_response_with(Some(&headers))
}
