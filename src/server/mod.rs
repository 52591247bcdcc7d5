//! Axum-based HTTP server for convertifier.
//!
//! Serves the converter web page and a small JSON API on top of the
//! conversion service.
//!
//! # Components
//!
//! - `handlers`: page, API, health and metrics endpoints.
//! - `middleware`: request ID tracking and per-route metrics.
//! - `page`: the server-rendered HTML form.
//! - `routes`: the router configuration that ties everything together.

mod handlers;
mod middleware;
mod page;
mod routes;

pub use handlers::{HealthResponse, HealthStatus};
pub use routes::{create_router, AppState};
