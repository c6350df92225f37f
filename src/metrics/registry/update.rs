// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Gauge refresh from cache, queue and API client state

use crate::cache::CacheStats;
use crate::metrics::labels::ResourceLabels;
use crate::platform::SlotStats;

use super::MetricsRegistry;

impl MetricsRegistry {
    #[allow(clippy::cast_possible_wrap)]
    pub fn update_cache_stats(&self, labels: &ResourceLabels, stats: CacheStats) {
        self.cache_entries
            .get_or_create(labels)
            .set(stats.entries as i64);
        self.cache_pending_delete
            .get_or_create(labels)
            .set(stats.pending_delete as i64);
        self.cache_deleted
            .get_or_create(labels)
            .set(stats.deleted as i64);
    }

    #[allow(clippy::cast_possible_wrap)]
    pub fn update_queue_depth(&self, depth: usize) {
        self.reload_queue_depth.set(depth as i64);
    }

    pub fn update_api_stats(&self, stats: SlotStats) {
        self.api_calls
            .set(i64::try_from(stats.calls).unwrap_or(i64::MAX));
        self.api_consecutive_errors
            .set(i64::from(stats.consecutive_errors));
    }
}
