// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Delayed eviction of entities the API reported gone
//!
//! Internal to the cache module. Each eviction is its own abortable task;
//! the grace period absorbs a "not found" that races a fresh creation.

use std::sync::Weak;
use std::time::Duration;
use tokio::task::AbortHandle;

use super::state::CacheState;

/// Spawns a task that evicts `guid` once `grace` has elapsed
pub(super) fn schedule_eviction(
    state: Weak<CacheState>,
    guid: String,
    grace: Duration,
) -> AbortHandle {
    let task = tokio::spawn(async move {
        tokio::time::sleep(grace).await;

        let Some(state) = state.upgrade() else {
            tracing::trace!("Cache dropped before eviction of {}", guid);
            return;
        };
        if let Some(pending) = state.evict(&guid) {
            tracing::info!(
                "Evicted {} {} after {:?} grace period",
                state.resource,
                guid,
                pending.marked_at.elapsed()
            );
        }
    });
    task.abort_handle()
}
