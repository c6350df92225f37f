// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Global execution slot for remote calls

use std::sync::{Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};

/// Tracks call health for metrics
#[derive(Clone, Debug, Default)]
struct CallState {
    calls: u64,
    consecutive_errors: u32,
    last_success_time: Option<tokio::time::Instant>,
}

impl CallState {
    fn record_success(&mut self) {
        self.consecutive_errors = 0;
        self.last_success_time = Some(tokio::time::Instant::now());
    }

    fn record_error(&mut self) {
        self.consecutive_errors = self.consecutive_errors.saturating_add(1);
    }
}

/// Snapshot of slot statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotStats {
    pub calls: u64,
    pub consecutive_errors: u32,
    pub has_succeeded: bool,
}

/// Single permit shared by every remote call in the process
///
/// Holding the permit is the only way to reach the transport; statistics are
/// kept behind a separate lock so metrics scrapes never wait on a slow call.
#[derive(Default)]
pub struct ExecutionSlot {
    gate: AsyncMutex<()>,
    state: Mutex<CallState>,
}

impl ExecutionSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other call is in flight
    pub(super) async fn acquire(&self) -> MutexGuard<'_, ()> {
        let permit = self.gate.lock().await;
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.calls += 1;
        permit
    }

    /// Records the outcome of the call made under the current permit
    pub(super) fn record(&self, success: bool) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if success {
            state.record_success();
        } else {
            state.record_error();
            tracing::trace!(
                "Remote call failed, consecutive errors: {}",
                state.consecutive_errors
            );
        }
    }

    #[must_use]
    pub fn stats(&self) -> SlotStats {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        SlotStats {
            calls: state.calls,
            consecutive_errors: state.consecutive_errors,
            has_succeeded: state.last_success_time.is_some(),
        }
    }
}
