use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::api::AppState;
use crate::metrics::ResourceLabels;

const OPENMETRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Copies cache, queue and API client state into the gauges
fn refresh_gauges(state: &AppState) {
    for resource in state.metadata.resources() {
        if let Some(cache) = state.metadata.cache(resource) {
            state
                .metrics
                .update_cache_stats(&ResourceLabels::new(resource), cache.stats());
        }
    }
    state
        .metrics
        .update_queue_depth(state.metadata.queue().len());
    state.metrics.update_api_stats(state.client.stats());
}

pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    refresh_gauges(&state);
    tracing::debug!("/metrics encode");
    match state.metrics.encode_metrics().await {
        Ok(metrics_text) => (
            StatusCode::OK,
            [("Content-Type", OPENMETRICS_CONTENT_TYPE)],
            metrics_text,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
                .into_response()
        }
    }
}
