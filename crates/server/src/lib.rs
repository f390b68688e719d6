pub mod config;
pub mod db;
pub mod health;
pub mod repo;
pub mod rest;
pub mod storage;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use db::AppState;

/// Full application router: REST API, health check and HTTP middleware.
///
/// Request bodies above `max_upload_bytes` are rejected with 413.
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(rest::api_router())
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
