// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Metrics registry and update logic

mod init;
mod reload;
mod update;

use crate::error::{AppError, Result};
use crate::metrics::labels::ResourceLabels;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Arc<Mutex<Registry>>,
    // reload outcome counters
    reload_success: Family<ResourceLabels, Counter>,
    reload_errors: Family<ResourceLabels, Counter>,
    reload_deferred: Family<ResourceLabels, Counter>,
    reload_dropped: Family<ResourceLabels, Counter>,
    reload_duration_milliseconds: Family<ResourceLabels, Gauge>,
    // cache gauges
    cache_entries: Family<ResourceLabels, Gauge>,
    cache_deleted: Family<ResourceLabels, Gauge>,
    cache_pending_delete: Family<ResourceLabels, Gauge>,
    // scheduler and API gauges
    reload_queue_depth: Gauge,
    api_calls: Gauge,
    api_consecutive_errors: Gauge,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub async fn encode_metrics(&self) -> Result<String> {
        let registry = self.registry.lock().await;
        let mut buffer = String::new();
        encode(&mut buffer, &registry).map_err(|e| AppError::Metrics(e.to_string()))?;
        Ok(buffer)
    }
}
