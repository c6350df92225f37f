//! HTTP API module
//!
//! # Endpoints
//! - `GET /health`: health check
//! - `GET /metrics`: Prometheus metrics
//! - `GET /metadata/{resource}`: cached entities of a resource type
//! - `GET /metadata/{resource}/{guid}`: one entity
//! - `POST /metadata/{resource}/reload`: queue a reload

pub mod handlers;
mod state;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

pub use state::AppState;

/// Creates the main Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/metadata/{resource}", get(handlers::list_entities))
        .route("/metadata/{resource}/reload", post(handlers::request_reload))
        .route("/metadata/{resource}/{guid}", get(handlers::get_entity))
        .with_state(state)
}
