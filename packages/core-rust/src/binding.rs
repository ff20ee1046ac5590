//! Structured log bindings derived from the request context.
//!
//! Every value bound through [`bind_logged`] is attached twice: to the
//! context store, where business logic reads it, and to a `tracing` span that
//! wraps the bound future. The span is entered only while that future is
//! polled, so each log record carries the fields of exactly the request that
//! emitted it.
//!
//! Binding spans are created at `ERROR` level: any filter that lets a record
//! through also keeps the spans that carry its bindings.

use std::collections::BTreeMap;
use std::future::Future;

use tracing::instrument::Instrumented;
use tracing::{error_span, Instrument, Span};

use crate::context::{self, ContextKey, Scoped, REQUEST_ID, TENANT_ID};

/// A future bound to one context value and one log span.
pub type Bound<F> = Instrumented<Scoped<F>>;

/// Builds the span that carries `key = value` into every nested log record.
///
/// The span is parented to whatever span is current at the call site, so a
/// tenant span created inside a request span inherits `request_id`.
#[must_use]
pub fn binding_span(key: ContextKey, value: &str) -> Span {
    if key == REQUEST_ID {
        error_span!("request", request_id = %value)
    } else if key == TENANT_ID {
        error_span!("tenant", tenant_id = %value)
    } else {
        error_span!("context", key = key.name(), value = %value)
    }
}

/// Binds `key` in the context store and in the log span of `fut`.
///
/// Both the span parent and the inherited bindings are captured here, so a
/// nested binding must be created from inside the enclosing bound future,
/// not built eagerly and passed in.
pub fn bind_logged<F: Future>(key: ContextKey, value: impl Into<String>, fut: F) -> Bound<F> {
    let value = value.into();
    let span = binding_span(key, &value);
    context::bind(key, value, fut).instrument(span)
}

/// The fields currently merged into log records, by field name.
#[must_use]
pub fn log_bindings() -> BTreeMap<&'static str, String> {
    context::snapshot()
        .iter()
        .map(|(name, value)| (name, value.to_owned()))
        .collect()
}
