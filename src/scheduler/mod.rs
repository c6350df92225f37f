// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Reload scheduling module
//!
//! Owns the queue of pending reloads across all resource types and a single
//! background worker that sleeps until the earliest request is due (or a new
//! one arrives), throttles keys reloaded too recently and retries failures.

mod queue;
mod registry;
mod request;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::SchedulerConfig;
use crate::metrics::{MetricsRegistry, ResourceLabels};

pub use queue::ReloadQueue;
pub use registry::{HandlerRegistry, HandlerRegistryBuilder, ReloadHandler};
pub use request::{ReloadKey, ReloadRequest};

/// What happened to a request taken off the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Loaded,
    /// Reloaded too recently; requeued for later
    Deferred,
    /// Load failed; requeued with backoff
    Retrying,
    /// Given up on, or no handler registered
    Dropped,
}

/// Background reload worker
pub struct ReloadScheduler {
    queue: ReloadQueue,
    registry: Arc<HandlerRegistry>,
    metrics: MetricsRegistry,
    max_attempts: u32,
    retry_delay: Duration,
}

impl ReloadScheduler {
    #[must_use]
    pub fn new(
        queue: ReloadQueue,
        registry: Arc<HandlerRegistry>,
        metrics: MetricsRegistry,
        config: &SchedulerConfig,
    ) -> Self {
        for resource in registry.resources() {
            metrics.initialize_resource_metrics(&ResourceLabels::new(resource));
        }
        Self {
            queue,
            registry,
            metrics,
            max_attempts: config.max_attempts.max(1),
            retry_delay: config.retry_delay,
        }
    }

    /// Spawns the worker loop; it stops when `shutdown_rx` turns `true`
    pub fn start(self, shutdown_rx: watch::Receiver<bool>) -> JoinHandle<()> {
        tracing::info!(
            "Starting reload scheduler for {} resource type(s)",
            self.registry.len()
        );
        tokio::spawn(self.run(shutdown_rx))
    }

    async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        loop {
            self.drain_ready().await;

            let deadline = self.queue.next_deadline();
            tracing::trace!("Scheduler idle, next deadline: {:?}", deadline);

            tokio::select! {
                () = sleep_until(deadline) => {},
                () = self.queue.notified() => {},
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        tracing::info!("Stopping reload scheduler ({} request(s) pending)", self.queue.len());
                        break;
                    }
                }
            }
        }
    }

    /// Processes every request that is due, returning how many were taken
    pub async fn drain_ready(&self) -> usize {
        let mut handled = 0;
        while let Some(request) = self.queue.take_ready(Instant::now()) {
            self.process(request).await;
            handled += 1;
        }
        self.metrics.update_queue_depth(self.queue.len());
        handled
    }

    /// Runs one due request through the interval check, the load and retry policy
    pub async fn process(&self, mut request: ReloadRequest) -> Outcome {
        let labels = ResourceLabels::new(request.resource);

        let Some(handler) = self.registry.get(request.resource) else {
            tracing::warn!("No reload handler registered for {}, dropping {}", request.resource, request);
            self.metrics.record_reload_dropped(&labels);
            return Outcome::Dropped;
        };

        if let Some(last_loaded) = handler.last_loaded_at(&request.key) {
            let earliest = last_loaded + handler.min_reload_interval();
            if Instant::now() < earliest {
                tracing::debug!(
                    "Reload {} throttled, loaded {:?} ago; deferring {:?}",
                    request,
                    last_loaded.elapsed(),
                    earliest.saturating_duration_since(Instant::now())
                );
                request.not_before = earliest;
                self.queue.enqueue(request);
                self.metrics.record_reload_deferred(&labels);
                return Outcome::Deferred;
            }
        }

        let start = Instant::now();
        match handler.load(&request.key).await {
            Ok(()) => {
                let duration = start.elapsed().as_secs_f64();
                self.metrics.record_reload_success(&labels, duration);
                tracing::debug!("Reloaded {} in {:.3}s", request, duration);
                Outcome::Loaded
            }
            Err(e) => {
                request.attempts += 1;
                self.metrics.record_reload_error(&labels);

                if request.attempts < self.max_attempts {
                    tracing::warn!(
                        "Reload {} failed (attempt {}/{}), retrying in {:?}: {}",
                        request,
                        request.attempts,
                        self.max_attempts,
                        self.retry_delay,
                        e
                    );
                    request.not_before = Instant::now() + self.retry_delay;
                    self.queue.enqueue(request);
                    Outcome::Retrying
                } else {
                    tracing::error!(
                        "Giving up on reload {} after {} attempts: {}",
                        request,
                        request.attempts,
                        e
                    );
                    self.metrics.record_reload_dropped(&labels);
                    Outcome::Dropped
                }
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, Result};
    use crate::platform::ResourceType;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Handler recording when it was invoked
    struct RecordingHandler {
        fail: bool,
        interval: Duration,
        last_loaded: Mutex<Option<Instant>>,
        invocations: Mutex<Vec<(ReloadKey, Instant)>>,
    }

    impl RecordingHandler {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail,
                interval: Duration::from_secs(10),
                last_loaded: Mutex::new(None),
                invocations: Mutex::new(Vec::new()),
            })
        }

        fn loaded_at(&self, at: Instant) {
            *self.last_loaded.lock().unwrap() = Some(at);
        }

        fn invocations(&self) -> Vec<(ReloadKey, Instant)> {
            self.invocations.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReloadHandler for RecordingHandler {
        async fn load(&self, key: &ReloadKey) -> Result<()> {
            self.invocations
                .lock()
                .unwrap()
                .push((key.clone(), Instant::now()));
            if self.fail {
                return Err(AppError::Transport("upstream unavailable".to_string()));
            }
            *self.last_loaded.lock().unwrap() = Some(Instant::now());
            Ok(())
        }

        fn last_loaded_at(&self, _key: &ReloadKey) -> Option<Instant> {
            *self.last_loaded.lock().unwrap()
        }

        fn min_reload_interval(&self) -> Duration {
            self.interval
        }
    }

    fn scheduler_with(handler: Arc<RecordingHandler>) -> (ReloadQueue, ReloadScheduler) {
        let queue = ReloadQueue::new();
        let registry = HandlerRegistry::builder()
            .register(ResourceType::App, handler)
            .build();
        let scheduler = ReloadScheduler::new(
            queue.clone(),
            Arc::new(registry),
            MetricsRegistry::new(),
            &SchedulerConfig::default(),
        );
        (queue, scheduler)
    }

    #[tokio::test(start_paused = true)]
    async fn test_unloaded_key_executes_immediately() {
        let handler = RecordingHandler::new(false);
        let (queue, scheduler) = scheduler_with(handler.clone());

        queue.submit(ResourceType::App, ReloadKey::guid("app-1"), Duration::ZERO);
        assert_eq!(scheduler.drain_ready().await, 1);

        assert_eq!(handler.invocations().len(), 1);
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_recent_load_defers_request() {
        let handler = RecordingHandler::new(false);
        let (queue, scheduler) = scheduler_with(handler.clone());
        let t0 = Instant::now();
        handler.loaded_at(t0);

        queue.submit(ResourceType::App, ReloadKey::guid("app-1"), Duration::ZERO);
        let request = queue.take_ready(Instant::now()).unwrap();
        assert_eq!(scheduler.process(request).await, Outcome::Deferred);

        assert!(handler.invocations().is_empty());
        let pending = queue.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].not_before, t0 + Duration::from_secs(10));
        assert_eq!(pending[0].attempts, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_minimum_interval_enforced_by_worker() {
        let handler = RecordingHandler::new(false);
        let (queue, scheduler) = scheduler_with(handler.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let t0 = Instant::now();
        handler.loaded_at(t0);

        let worker = scheduler.start(shutdown_rx);
        queue.submit(ResourceType::App, ReloadKey::guid("app-1"), Duration::ZERO);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(handler.invocations().is_empty());

        tokio::time::sleep(Duration::from_secs(6)).await;
        let invocations = handler.invocations();
        assert_eq!(invocations.len(), 1);
        assert!(invocations[0].1 >= t0 + Duration::from_secs(10));

        let _ = shutdown_tx.send(true);
        worker.await.expect("worker panicked");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_handler_retried_then_dropped() {
        let handler = RecordingHandler::new(true);
        let (queue, scheduler) = scheduler_with(handler.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = scheduler.start(shutdown_rx);
        queue.submit(ResourceType::App, ReloadKey::guid("app-1"), Duration::ZERO);

        tokio::time::sleep(Duration::from_secs(600)).await;

        let invocations = handler.invocations();
        assert_eq!(invocations.len(), 5);
        for pair in invocations.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= Duration::from_secs(30));
        }
        assert!(queue.is_empty());

        let _ = shutdown_tx.send(true);
        worker.await.expect("worker panicked");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_keeps_attempt_count() {
        let handler = RecordingHandler::new(true);
        let (queue, scheduler) = scheduler_with(handler);

        queue.submit(ResourceType::App, ReloadKey::All, Duration::ZERO);
        let request = queue.take_ready(Instant::now()).unwrap();
        assert_eq!(scheduler.process(request).await, Outcome::Retrying);

        let pending = queue.pending();
        assert_eq!(pending[0].attempts, 1);
        assert_eq!(pending[0].not_before, Instant::now() + Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_resource_is_dropped() {
        let handler = RecordingHandler::new(false);
        let (queue, scheduler) = scheduler_with(handler);

        queue.submit(ResourceType::Stack, ReloadKey::All, Duration::ZERO);
        let request = queue.take_ready(Instant::now()).unwrap();
        assert_eq!(scheduler.process(request).await, Outcome::Dropped);
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_wakes_on_submit_and_stops_on_shutdown() {
        let handler = RecordingHandler::new(false);
        let (queue, scheduler) = scheduler_with(handler.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = scheduler.start(shutdown_rx);
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(handler.invocations().is_empty());

        queue.submit(ResourceType::App, ReloadKey::guid("late"), Duration::from_secs(2));
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(handler.invocations().len(), 1);

        let _ = shutdown_tx.send(true);
        tokio::time::timeout(Duration::from_secs(1), worker)
            .await
            .expect("worker did not stop")
            .expect("worker panicked");
    }
}
