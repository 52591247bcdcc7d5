// HTTP routes configuration

use super::handlers::{
    api_convert_handler, api_highlight_handler, api_validate_handler, convert_form_handler,
    health_handler, index_handler, metrics_handler, not_found_handler,
};
use super::middleware::{request_id_layers, track_metrics};
use crate::config::AppConfig;
use crate::converter::Converter;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub converter: Arc<Converter>,
}

pub fn create_router(config: AppConfig, converter: Converter) -> Router {
    let body_limit = config.server.max_body_bytes;
    let state = AppState {
        config,
        converter: Arc::new(converter),
    };

    let (set_request_id, propagate_request_id) = request_id_layers();

    Router::new()
        .route("/", get(index_handler))
        .route("/convert", post(convert_form_handler))
        .route("/api/convert", post(api_convert_handler))
        .route("/api/validate", post(api_validate_handler))
        .route("/api/highlight", post(api_highlight_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route_layer(middleware::from_fn(track_metrics))
        .fallback(not_found_handler)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state)
}
