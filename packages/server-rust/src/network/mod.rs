//! Router assembly, handlers, API docs, server lifecycle, and shutdown control.

pub mod handlers;
pub mod module;
pub mod openapi;
pub mod shutdown;

pub use handlers::AppState;
pub use module::{build_router, NetworkModule};
pub use shutdown::*;
