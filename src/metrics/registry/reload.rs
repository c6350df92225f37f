// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Reload outcome bookkeeping

use crate::metrics::labels::ResourceLabels;

use super::MetricsRegistry;

impl MetricsRegistry {
    pub fn record_reload_success(&self, labels: &ResourceLabels, duration_secs: f64) {
        self.reload_success.get_or_create(labels).inc();
        #[allow(clippy::cast_possible_truncation)]
        let millis = (duration_secs * 1000.0).round() as i64;
        self.reload_duration_milliseconds
            .get_or_create(labels)
            .set(millis);
    }

    pub fn record_reload_error(&self, labels: &ResourceLabels) {
        self.reload_errors.get_or_create(labels).inc();
    }

    pub fn record_reload_deferred(&self, labels: &ResourceLabels) {
        self.reload_deferred.get_or_create(labels).inc();
    }

    pub fn record_reload_dropped(&self, labels: &ResourceLabels) {
        self.reload_dropped.get_or_create(labels).inc();
    }

    /// Initialize metrics for a resource type to zero
    ///
    /// Counters exist from the start so rates can be computed before the
    /// first reload of that type.
    pub fn initialize_resource_metrics(&self, labels: &ResourceLabels) {
        let _ = self.reload_success.get_or_create(labels);
        let _ = self.reload_errors.get_or_create(labels);
        let _ = self.reload_deferred.get_or_create(labels);
        let _ = self.reload_dropped.get_or_create(labels);
        let _ = self.cache_entries.get_or_create(labels);
    }
}
