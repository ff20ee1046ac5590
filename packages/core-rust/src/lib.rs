//! Stratum Core: request context store, structured log bindings, and the error envelope.

pub mod binding;
pub mod context;
pub mod envelope;

pub use binding::{bind_logged, log_bindings};
pub use context::{
    generate_request_id, ContextGuard, ContextKey, RequestContext, Token, DEFAULT_TENANT,
    REQUEST_ID, TENANT_ID,
};
pub use envelope::{ErrorBody, ErrorEnvelope, ErrorKind};
