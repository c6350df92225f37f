// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Registry initialization and metric registration

use crate::metrics::labels::ResourceLabels;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::MetricsRegistry;

impl MetricsRegistry {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let reload_success = Family::<ResourceLabels, Counter>::default();
        registry.register(
            "metadata_reload_success",
            "Successful reloads per resource type",
            reload_success.clone(),
        );
        let reload_errors = Family::<ResourceLabels, Counter>::default();
        registry.register(
            "metadata_reload_errors",
            "Failed reload attempts per resource type",
            reload_errors.clone(),
        );
        let reload_deferred = Family::<ResourceLabels, Counter>::default();
        registry.register(
            "metadata_reload_deferred",
            "Reloads postponed by the minimum reload interval",
            reload_deferred.clone(),
        );
        let reload_dropped = Family::<ResourceLabels, Counter>::default();
        registry.register(
            "metadata_reload_dropped",
            "Reloads abandoned after the retry cap or for lack of a handler",
            reload_dropped.clone(),
        );
        let reload_duration_milliseconds = Family::<ResourceLabels, Gauge>::default();
        registry.register(
            "metadata_reload_duration_milliseconds",
            "Duration of the last successful reload in milliseconds",
            reload_duration_milliseconds.clone(),
        );

        let cache_entries = Family::<ResourceLabels, Gauge>::default();
        registry.register(
            "metadata_cache_entries",
            "Entities currently cached",
            cache_entries.clone(),
        );
        let cache_deleted = Family::<ResourceLabels, Gauge>::default();
        registry.register(
            "metadata_cache_deleted",
            "Entities evicted after the API reported them gone",
            cache_deleted.clone(),
        );
        let cache_pending_delete = Family::<ResourceLabels, Gauge>::default();
        registry.register(
            "metadata_cache_pending_delete",
            "Entities waiting out the deletion grace period",
            cache_pending_delete.clone(),
        );

        let reload_queue_depth = Gauge::default();
        registry.register(
            "metadata_reload_queue_depth",
            "Reload requests waiting in the queue",
            reload_queue_depth.clone(),
        );
        let api_calls = Gauge::default();
        registry.register(
            "metadata_api_calls",
            "Remote API calls issued since startup",
            api_calls.clone(),
        );
        let api_consecutive_errors = Gauge::default();
        registry.register(
            "metadata_api_consecutive_errors",
            "Consecutive failed remote API calls",
            api_consecutive_errors.clone(),
        );

        Self {
            registry: Arc::new(Mutex::new(registry)),
            reload_success,
            reload_errors,
            reload_deferred,
            reload_dropped,
            reload_duration_milliseconds,
            cache_entries,
            cache_deleted,
            cache_pending_delete,
            reload_queue_depth,
            api_calls,
            api_consecutive_errors,
        }
    }
}
