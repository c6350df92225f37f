// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Per-resource-type entity cache
//!
//! Readers get the current snapshot without waiting on the network; the
//! reload scheduler drives all loading through [`ReloadHandler`].

mod entity;
mod eviction;
mod state;

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::config::CacheConfig;
use crate::error::Result;
use crate::platform::{EntitySource, ResourceType};
use crate::scheduler::{ReloadHandler, ReloadKey, ReloadQueue};

pub use entity::Entity;
pub use state::EntryMap;

use state::{CacheState, Lookup};

/// What `find` does after creating a placeholder for an unseen GUID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissPolicy {
    /// Only the placeholder; loading is left to explicit reload requests
    Placeholder,
    /// Queue a reload of the missing entity
    LoadItem,
    /// Queue a full collection load, at most one in flight
    LoadAll,
}

impl MissPolicy {
    /// Large, frequently-missed collections load item by item; small ones load whole
    #[must_use]
    pub fn default_for(resource: ResourceType) -> Self {
        match resource {
            ResourceType::App | ResourceType::Space | ResourceType::Org => MissPolicy::LoadItem,
            ResourceType::Route
            | ResourceType::Domain
            | ResourceType::OrgQuota
            | ResourceType::SpaceQuota
            | ResourceType::IsolationSegment
            | ResourceType::Stack => MissPolicy::LoadAll,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub pending_delete: usize,
    pub deleted: usize,
}

/// GUID → entity map of one resource type
pub struct EntityCache {
    resource: ResourceType,
    source: Arc<dyn EntitySource>,
    queue: ReloadQueue,
    miss_policy: MissPolicy,
    min_reload_interval: Duration,
    delete_grace: Duration,
    state: Arc<CacheState>,
    last_full_load: Mutex<Option<Instant>>,
    full_load_in_flight: AtomicBool,
    /// Missed GUIDs a successful full load did not return
    unlisted: Mutex<HashSet<String>>,
}

impl EntityCache {
    #[must_use]
    pub fn new(
        resource: ResourceType,
        source: Arc<dyn EntitySource>,
        queue: ReloadQueue,
        config: &CacheConfig,
    ) -> Self {
        Self {
            resource,
            source,
            queue,
            miss_policy: MissPolicy::default_for(resource),
            min_reload_interval: config.min_reload_interval,
            delete_grace: config.delete_grace,
            state: Arc::new(CacheState::new(resource)),
            last_full_load: Mutex::new(None),
            full_load_in_flight: AtomicBool::new(false),
            unlisted: Mutex::new(HashSet::new()),
        }
    }

    #[must_use]
    pub fn with_miss_policy(mut self, miss_policy: MissPolicy) -> Self {
        self.miss_policy = miss_policy;
        self
    }

    #[must_use]
    pub fn resource(&self) -> ResourceType {
        self.resource
    }

    #[must_use]
    pub fn miss_policy(&self) -> MissPolicy {
        self.miss_policy
    }

    /// Cached entity, or a placeholder named after the GUID
    ///
    /// Never waits on I/O. A new placeholder triggers the miss policy; GUIDs
    /// known deleted get a detached placeholder and no reload.
    pub fn find(&self, guid: &str) -> Arc<Entity> {
        if let Some(entity) = self.state.get(guid) {
            return entity;
        }

        match self.state.get_or_insert_placeholder(guid) {
            Lookup::Cached(entity) | Lookup::Deleted(entity) => entity,
            Lookup::Created(entity) => {
                tracing::trace!("Cache miss for {} {}", self.resource, guid);
                self.on_miss(guid);
                entity
            }
        }
    }

    fn on_miss(&self, guid: &str) {
        match self.miss_policy {
            MissPolicy::Placeholder => {}
            MissPolicy::LoadItem => {
                self.queue
                    .submit(self.resource, ReloadKey::guid(guid), Duration::ZERO);
            }
            MissPolicy::LoadAll => {
                if self.is_unlisted(guid) {
                    tracing::trace!("{} {} not listed upstream, no full load", self.resource, guid);
                    return;
                }
                if !self.full_load_in_flight.swap(true, Ordering::AcqRel) {
                    tracing::debug!("Miss on {} {}, requesting full load", self.resource, guid);
                    self.queue
                        .submit(self.resource, ReloadKey::All, Duration::ZERO);
                }
            }
        }
    }

    /// Reloads a single entity
    ///
    /// GUIDs pending delete or already deleted are skipped. An entity the
    /// API no longer knows is evicted after the grace period.
    pub async fn load_one(&self, guid: &str) -> Result<()> {
        if self.state.is_pending(guid) {
            tracing::debug!("Skipping reload of {} {}: pending delete", self.resource, guid);
            return Ok(());
        }
        if self.state.is_deleted(guid) {
            tracing::debug!("Skipping reload of {} {}: deleted", self.resource, guid);
            return Ok(());
        }

        let remote = self.source.fetch_entity(self.resource, guid).await?;

        if remote.is_gone() {
            if self.schedule_delete(guid) {
                tracing::info!(
                    "{} {} no longer exists upstream, evicting in {:?}",
                    self.resource,
                    guid,
                    self.delete_grace
                );
            }
            return Ok(());
        }

        self.unlisted_set().remove(guid);
        self.add(Entity::from_remote(self.resource, remote, Instant::now()));
        Ok(())
    }

    /// Replaces the whole map with a fresh collection load
    ///
    /// Placeholders the collection does not contain stop triggering full
    /// loads on later misses; only an explicit reload asks for them again.
    pub async fn load_all(&self) -> Result<()> {
        let before = self.state.snapshot();
        let result = self.source.fetch_collection(self.resource).await;
        self.full_load_in_flight.store(false, Ordering::Release);
        let remote = result?;

        let now = Instant::now();
        let entities: Vec<Entity> = remote
            .into_iter()
            .filter(|r| !r.guid.is_empty())
            .map(|r| Entity::from_remote(self.resource, r, now))
            .collect();
        let fetched = entities.len();
        self.track_unlisted(&before, &entities);
        let skipped = self.state.replace_all(entities);

        *self
            .last_full_load
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(now);

        tracing::info!(
            "Loaded {} {} ({} deleted skipped)",
            fetched - skipped,
            self.resource,
            skipped
        );
        Ok(())
    }

    fn track_unlisted(&self, before: &EntryMap, fetched: &[Entity]) {
        let listed: HashSet<&str> = fetched.iter().map(|e| e.guid.as_str()).collect();
        let mut unlisted = self.unlisted_set();
        for entity in before.values().filter(|e| !e.is_loaded()) {
            if !listed.contains(entity.guid.as_str()) && unlisted.insert(entity.guid.clone()) {
                tracing::debug!(
                    "{} {} missing from full load, not requesting it again",
                    self.resource,
                    entity.guid
                );
            }
        }
        unlisted.retain(|guid| !listed.contains(guid.as_str()));
    }

    fn unlisted_set(&self) -> MutexGuard<'_, HashSet<String>> {
        self.unlisted.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_unlisted(&self, guid: &str) -> bool {
        self.unlisted_set().contains(guid)
    }

    /// Inserts or replaces an entity; returns `false` for deleted GUIDs
    pub fn add(&self, entity: Entity) -> bool {
        let guid = entity.guid.clone();
        let added = self.state.insert(entity);
        if added {
            tracing::trace!("Cached {} {}", self.resource, guid);
        } else {
            tracing::debug!("Refusing to cache deleted {} {}", self.resource, guid);
        }
        added
    }

    /// Evicts a GUID immediately, cancelling any scheduled eviction
    pub fn delete(&self, guid: &str) {
        if let Some(pending) = self.state.evict(guid) {
            pending.task.abort();
        }
        tracing::debug!("Deleted {} {}", self.resource, guid);
    }

    /// Starts the grace period for `guid`; `false` if already pending or deleted
    fn schedule_delete(&self, guid: &str) -> bool {
        let state = Arc::downgrade(&self.state);
        let grace = self.delete_grace;
        self.state.mark_pending(guid, || {
            eviction::schedule_eviction(state, guid.to_string(), grace)
        })
    }

    #[must_use]
    pub fn is_deleted(&self, guid: &str) -> bool {
        self.state.is_deleted(guid)
    }

    #[must_use]
    pub fn is_pending_delete(&self, guid: &str) -> bool {
        self.state.is_pending(guid)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn deleted_len(&self) -> usize {
        self.state.tombstone_counts().1
    }

    /// All cached entries as of now
    #[must_use]
    pub fn snapshot(&self) -> Arc<EntryMap> {
        self.state.snapshot()
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let (pending_delete, deleted) = self.state.tombstone_counts();
        CacheStats {
            entries: self.state.len(),
            pending_delete,
            deleted,
        }
    }

    #[must_use]
    pub fn last_full_load(&self) -> Option<Instant> {
        *self
            .last_full_load
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ReloadHandler for EntityCache {
    async fn load(&self, key: &ReloadKey) -> Result<()> {
        match key {
            ReloadKey::All => self.load_all().await,
            ReloadKey::Guid(guid) => self.load_one(guid).await,
        }
    }

    fn last_loaded_at(&self, key: &ReloadKey) -> Option<Instant> {
        match key {
            ReloadKey::All => self.last_full_load(),
            ReloadKey::Guid(guid) => self.state.get(guid).and_then(|e| e.last_loaded_at),
        }
    }

    fn min_reload_interval(&self) -> Duration {
        self.min_reload_interval
    }
}

impl Drop for EntityCache {
    fn drop(&mut self) {
        self.state.abort_pending();
    }
}
