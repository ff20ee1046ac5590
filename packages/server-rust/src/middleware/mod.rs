//! Per-request middleware: context binding, timeout, and the composed pipeline.

pub mod request_id;
pub mod stack;
pub mod tenant;
pub mod timeout;

pub use request_id::{current_request_id, RequestId, RequestIdLayer, REQUEST_ID_HEADER};
pub use stack::{request_layers, with_request_pipeline};
pub use tenant::{current_tenant_id, Tenant, TenantLayer, TENANT_ID_HEADER};
pub use timeout::RequestTimeoutLayer;
