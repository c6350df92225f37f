// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Shared queue of pending reload requests

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

use super::request::{ReloadKey, ReloadRequest};
use crate::platform::ResourceType;

#[derive(Default)]
struct QueueInner {
    requests: Mutex<Vec<ReloadRequest>>,
    wake: Notify,
}

/// Handle to the reload queue
///
/// Cheap to clone; producers submit from any task without suspending, the
/// scheduler worker is the only consumer.
#[derive(Clone, Default)]
pub struct ReloadQueue {
    inner: Arc<QueueInner>,
}

impl ReloadQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn requests(&self) -> MutexGuard<'_, Vec<ReloadRequest>> {
        self.inner
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues a reload to run no earlier than `delay` from now
    ///
    /// Returns `false` when an equivalent or broader request is already queued.
    pub fn submit(&self, resource: ResourceType, key: ReloadKey, delay: Duration) -> bool {
        let request = ReloadRequest::new(resource, key, Instant::now() + delay);
        self.enqueue(request)
    }

    /// Queues a prepared request, keeping at most one per resource type and key
    pub fn enqueue(&self, request: ReloadRequest) -> bool {
        {
            let mut requests = self.requests();
            if requests.iter().any(|queued| queued.supersedes(&request)) {
                tracing::trace!("Reload {} already covered by a queued request", request);
                return false;
            }
            if request.key.is_all() {
                let before = requests.len();
                requests.retain(|queued| queued.resource != request.resource);
                let removed = before - requests.len();
                if removed > 0 {
                    tracing::debug!(
                        "Full reload of {} replaced {} queued item reload(s)",
                        request.resource,
                        removed
                    );
                }
            }
            tracing::trace!("Queued reload {} (attempts: {})", request, request.attempts);
            requests.push(request);
        }
        self.inner.wake.notify_one();
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.requests().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests().is_empty()
    }

    /// Whether a request for exactly this resource type and key is queued
    #[must_use]
    pub fn contains(&self, resource: ResourceType, key: &ReloadKey) -> bool {
        self.requests()
            .iter()
            .any(|queued| queued.resource == resource && &queued.key == key)
    }

    /// Copy of the queued requests
    #[must_use]
    pub fn pending(&self) -> Vec<ReloadRequest> {
        self.requests().clone()
    }

    /// Earliest `not_before` across the queue
    pub(super) fn next_deadline(&self) -> Option<Instant> {
        self.requests().iter().map(|r| r.not_before).min()
    }

    /// Removes the most overdue request whose time has come
    pub(super) fn take_ready(&self, now: Instant) -> Option<ReloadRequest> {
        let mut requests = self.requests();
        let index = requests
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_ready(now))
            .min_by_key(|(_, r)| r.not_before)
            .map(|(index, _)| index)?;
        Some(requests.swap_remove(index))
    }

    /// Resolves after the next submission (or immediately if one is pending)
    pub(super) async fn notified(&self) {
        self.inner.wake.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_submission_is_dropped() {
        let queue = ReloadQueue::new();
        assert!(queue.submit(ResourceType::App, ReloadKey::guid("a-1"), Duration::ZERO));
        assert!(!queue.submit(
            ResourceType::App,
            ReloadKey::guid("a-1"),
            Duration::from_secs(5)
        ));
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_guid_different_types_coexist() {
        let queue = ReloadQueue::new();
        queue.submit(ResourceType::App, ReloadKey::guid("x"), Duration::ZERO);
        queue.submit(ResourceType::Space, ReloadKey::guid("x"), Duration::ZERO);
        assert_eq!(queue.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_supersedes_queued_items() {
        let queue = ReloadQueue::new();
        queue.submit(ResourceType::App, ReloadKey::guid("a"), Duration::ZERO);
        queue.submit(ResourceType::App, ReloadKey::guid("b"), Duration::ZERO);
        queue.submit(ResourceType::Space, ReloadKey::guid("s"), Duration::ZERO);

        assert!(queue.submit(ResourceType::App, ReloadKey::All, Duration::ZERO));

        assert_eq!(queue.len(), 2);
        assert!(queue.contains(ResourceType::App, &ReloadKey::All));
        assert!(!queue.contains(ResourceType::App, &ReloadKey::guid("a")));
        assert!(queue.contains(ResourceType::Space, &ReloadKey::guid("s")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_item_dropped_while_all_queued() {
        let queue = ReloadQueue::new();
        queue.submit(ResourceType::Route, ReloadKey::All, Duration::from_secs(3));
        assert!(!queue.submit(ResourceType::Route, ReloadKey::guid("r-1"), Duration::ZERO));
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_take_ready_respects_not_before() {
        let queue = ReloadQueue::new();
        queue.submit(ResourceType::App, ReloadKey::guid("late"), Duration::from_secs(10));
        queue.submit(ResourceType::App, ReloadKey::guid("soon"), Duration::from_secs(2));

        let now = Instant::now();
        assert!(queue.take_ready(now).is_none());
        assert_eq!(queue.next_deadline(), Some(now + Duration::from_secs(2)));

        tokio::time::advance(Duration::from_secs(11)).await;
        let first = queue.take_ready(Instant::now()).unwrap();
        assert_eq!(first.key, ReloadKey::guid("soon"));
        let second = queue.take_ready(Instant::now()).unwrap();
        assert_eq!(second.key, ReloadKey::guid("late"));
        assert!(queue.is_empty());
        assert_eq!(queue.next_deadline(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_wakes_waiter() {
        let queue = ReloadQueue::new();
        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.notified().await })
        };
        tokio::task::yield_now().await;
        queue.submit(ResourceType::Org, ReloadKey::All, Duration::ZERO);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter not woken")
            .expect("Task failed");
    }
}
