// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Entry map and deletion bookkeeping shared with eviction tasks
//!
//! Lock order is `entries` before `tombstones`; neither is held across an
//! `.await`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::task::AbortHandle;
use tokio::time::Instant;

use super::entity::Entity;
use crate::platform::ResourceType;

pub type EntryMap = HashMap<String, Arc<Entity>>;

pub(super) struct PendingDelete {
    pub marked_at: Instant,
    pub task: AbortHandle,
}

#[derive(Default)]
struct Tombstones {
    pending: HashMap<String, PendingDelete>,
    deleted: HashMap<String, Instant>,
}

/// Result of looking up a GUID that may need a placeholder
pub(super) enum Lookup {
    Cached(Arc<Entity>),
    /// Placeholder inserted by this call
    Created(Arc<Entity>),
    /// Known deleted; placeholder was not inserted
    Deleted(Arc<Entity>),
}

pub(super) struct CacheState {
    pub resource: ResourceType,
    entries: RwLock<Arc<EntryMap>>,
    tombstones: Mutex<Tombstones>,
}

impl CacheState {
    pub fn new(resource: ResourceType) -> Self {
        Self {
            resource,
            entries: RwLock::new(Arc::new(HashMap::new())),
            tombstones: Mutex::new(Tombstones::default()),
        }
    }

    fn tombstones(&self) -> MutexGuard<'_, Tombstones> {
        self.tombstones
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Current map; later writes never modify a returned snapshot
    pub fn snapshot(&self) -> Arc<EntryMap> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, guid: &str) -> Option<Arc<Entity>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(guid)
            .cloned()
    }

    pub fn get_or_insert_placeholder(&self, guid: &str) -> Lookup {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entity) = entries.get(guid) {
            return Lookup::Cached(entity.clone());
        }

        let placeholder = Arc::new(Entity::placeholder(self.resource, guid));
        if self.tombstones().deleted.contains_key(guid) {
            return Lookup::Deleted(placeholder);
        }
        Arc::make_mut(&mut *entries).insert(guid.to_string(), placeholder.clone());
        Lookup::Created(placeholder)
    }

    /// Inserts or replaces an entry; refused for deleted GUIDs
    pub fn insert(&self, entity: Entity) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if self.tombstones().deleted.contains_key(&entity.guid) {
            return false;
        }
        Arc::make_mut(&mut *entries).insert(entity.guid.clone(), Arc::new(entity));
        true
    }

    /// Swaps in a fresh map built from `entities`, returning how many deleted GUIDs were skipped
    pub fn replace_all(&self, entities: Vec<Entity>) -> usize {
        let mut fresh: EntryMap = entities
            .into_iter()
            .map(|entity| (entity.guid.clone(), Arc::new(entity)))
            .collect();

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let tombstones = self.tombstones();
        let before = fresh.len();
        fresh.retain(|guid, _| !tombstones.deleted.contains_key(guid));
        *entries = Arc::new(fresh);
        before - entries.len()
    }

    /// Moves `guid` from the map to the deleted set
    ///
    /// Returns the pending-delete record it replaces, if one existed.
    pub fn evict(&self, guid: &str) -> Option<PendingDelete> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let mut tombstones = self.tombstones();
        if entries.contains_key(guid) {
            Arc::make_mut(&mut *entries).remove(guid);
        }
        tombstones
            .deleted
            .entry(guid.to_string())
            .or_insert_with(Instant::now);
        tombstones.pending.remove(guid)
    }

    /// Marks `guid` pending delete, registering the task `spawn` starts
    ///
    /// No-op returning `false` if the GUID is already pending or deleted.
    pub fn mark_pending<F>(&self, guid: &str, spawn: F) -> bool
    where
        F: FnOnce() -> AbortHandle,
    {
        let mut tombstones = self.tombstones();
        if tombstones.pending.contains_key(guid) || tombstones.deleted.contains_key(guid) {
            return false;
        }
        let pending = PendingDelete {
            marked_at: Instant::now(),
            task: spawn(),
        };
        tombstones.pending.insert(guid.to_string(), pending);
        true
    }

    pub fn is_pending(&self, guid: &str) -> bool {
        self.tombstones().pending.contains_key(guid)
    }

    pub fn is_deleted(&self, guid: &str) -> bool {
        self.tombstones().deleted.contains_key(guid)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// `(pending_delete, deleted)` counts
    pub fn tombstone_counts(&self) -> (usize, usize) {
        let tombstones = self.tombstones();
        (tombstones.pending.len(), tombstones.deleted.len())
    }

    /// Cancels every scheduled eviction
    pub fn abort_pending(&self) {
        let tombstones = self.tombstones();
        for pending in tombstones.pending.values() {
            pending.task.abort();
        }
    }
}
