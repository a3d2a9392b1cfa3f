//! HTTP server module.
//!
//! Exposes the boat collection as a JSON REST API, in one of two route
//! layouts selected by [`ApiVersion`](crate::config::ApiVersion).

pub mod boats;
mod middleware;
pub mod routes;

pub use middleware::{create_cors_layer, create_trace_layer};
pub use routes::{create_router, AppState};
