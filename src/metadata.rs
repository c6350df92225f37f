// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Consumer-facing entry point to the metadata mirror
//!
//! Owns one [`EntityCache`] per resource type, the shared reload queue and
//! the handler registry the scheduler resolves requests through. Built once
//! in `main` and shared by reference.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::cache::{Entity, EntityCache};
use crate::config::{CacheConfig, SchedulerConfig};
use crate::metrics::MetricsRegistry;
use crate::platform::{EntitySource, ResourceType};
use crate::scheduler::{HandlerRegistry, ReloadHandler, ReloadKey, ReloadQueue, ReloadScheduler};

pub struct MetadataHub {
    queue: ReloadQueue,
    caches: HashMap<ResourceType, Arc<EntityCache>>,
    registry: Arc<HandlerRegistry>,
}

impl MetadataHub {
    /// Creates a cache for every resource type, all loading from `source`
    pub fn new(source: Arc<dyn EntitySource>, config: &CacheConfig) -> Self {
        let queue = ReloadQueue::new();
        let caches = ResourceType::ALL
            .iter()
            .map(|&resource| {
                let cache = EntityCache::new(resource, source.clone(), queue.clone(), config);
                (resource, Arc::new(cache))
            })
            .collect();
        Self::from_caches(queue, caches)
    }

    /// Assembles a hub from prepared caches sharing `queue`
    pub fn from_caches(queue: ReloadQueue, caches: HashMap<ResourceType, Arc<EntityCache>>) -> Self {
        let registry = caches
            .iter()
            .fold(HandlerRegistry::builder(), |builder, (&resource, cache)| {
                builder.register(resource, cache.clone())
            })
            .build();

        Self {
            queue,
            caches,
            registry: Arc::new(registry),
        }
    }

    /// Spawns the reload worker for this hub's queue
    pub fn start_scheduler(
        &self,
        metrics: MetricsRegistry,
        config: &SchedulerConfig,
        shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        ReloadScheduler::new(self.queue.clone(), self.registry.clone(), metrics, config)
            .start(shutdown_rx)
    }

    /// Cached entity or placeholder; never waits on the network
    pub fn find(&self, resource: ResourceType, guid: &str) -> Arc<Entity> {
        match self.caches.get(&resource) {
            Some(cache) => cache.find(guid),
            None => Arc::new(Entity::placeholder(resource, guid)),
        }
    }

    /// Queues a reload of one GUID (or `ALL`) to run after `delay`
    ///
    /// Returns `false` if an equivalent or broader request was already queued.
    pub fn request_reload(&self, resource: ResourceType, key: ReloadKey, delay: Duration) -> bool {
        self.queue.submit(resource, key, delay)
    }

    pub fn last_loaded_at(&self, resource: ResourceType, guid: &str) -> Option<Instant> {
        self.caches
            .get(&resource)?
            .last_loaded_at(&ReloadKey::guid(guid))
    }

    pub fn is_deleted(&self, resource: ResourceType, guid: &str) -> bool {
        self.caches
            .get(&resource)
            .is_some_and(|cache| cache.is_deleted(guid))
    }

    /// Requests a full load of each listed type, returning how many were queued
    pub fn preload(&self, resources: &[ResourceType]) -> usize {
        let queued = resources
            .iter()
            .filter(|&&resource| self.queue.submit(resource, ReloadKey::All, Duration::ZERO))
            .count();
        tracing::info!("Queued initial load of {} resource type(s)", queued);
        queued
    }

    pub fn cache(&self, resource: ResourceType) -> Option<&Arc<EntityCache>> {
        self.caches.get(&resource)
    }

    pub fn queue(&self) -> &ReloadQueue {
        &self.queue
    }

    /// Resource types with a cache, sorted
    pub fn resources(&self) -> Vec<ResourceType> {
        self.registry.resources()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::{FakeSource, Reply};

    fn hub() -> (Arc<FakeSource>, MetadataHub) {
        let source = Arc::new(FakeSource::new());
        let hub = MetadataHub::new(source.clone(), &CacheConfig::default());
        (source, hub)
    }

    #[tokio::test(start_paused = true)]
    async fn test_hub_covers_every_resource_type() {
        let (_source, hub) = hub();
        assert_eq!(hub.resources().len(), ResourceType::ALL.len());
        for resource in ResourceType::ALL {
            assert!(hub.cache(resource).is_some());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_find_miss_queues_item_reload() {
        let (_source, hub) = hub();
        let entity = hub.find(ResourceType::App, "app-1");
        assert_eq!(entity.name, "app-1");
        assert!(hub
            .queue()
            .contains(ResourceType::App, &ReloadKey::guid("app-1")));
        assert!(hub.last_loaded_at(ResourceType::App, "app-1").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_preload_skips_duplicates() {
        let (_source, hub) = hub();
        let queued = hub.preload(&[ResourceType::Org, ResourceType::Space, ResourceType::Org]);
        assert_eq!(queued, 2);
        assert_eq!(hub.queue().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_app_reload_then_deferred_resubmission() {
        let (source, hub) = hub();
        source.set_item("app-1", Reply::Name("web".to_string()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = hub.start_scheduler(
            MetricsRegistry::new(),
            &SchedulerConfig::default(),
            shutdown_rx,
        );

        let t0 = Instant::now();
        hub.request_reload(ResourceType::App, ReloadKey::guid("app-1"), Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(10)).await;

        let entity = hub.find(ResourceType::App, "app-1");
        assert_eq!(entity.name, "web");
        assert_eq!(entity.last_loaded_at, Some(t0));
        assert_eq!(source.item_calls("app-1"), 1);

        tokio::time::sleep_until(t0 + Duration::from_secs(2)).await;
        hub.request_reload(ResourceType::App, ReloadKey::guid("app-1"), Duration::ZERO);

        tokio::time::sleep_until(t0 + Duration::from_millis(9_900)).await;
        assert_eq!(source.item_calls("app-1"), 1);

        tokio::time::sleep_until(t0 + Duration::from_millis(10_100)).await;
        assert_eq!(source.item_calls("app-1"), 2);
        assert_eq!(
            hub.last_loaded_at(ResourceType::App, "app-1"),
            Some(t0 + Duration::from_secs(10))
        );

        let _ = shutdown_tx.send(true);
        worker.await.expect("worker panicked");
    }
}
