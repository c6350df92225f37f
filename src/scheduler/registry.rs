// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Resource type registry
//!
//! Maps each resource type to the handler that reloads it. Built once during
//! startup and read-only afterwards.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::request::ReloadKey;
use crate::error::Result;
use crate::platform::ResourceType;

/// Reload capability of one resource type
#[async_trait]
pub trait ReloadHandler: Send + Sync {
    /// Reloads one entity or, for [`ReloadKey::All`], the whole collection
    async fn load(&self, key: &ReloadKey) -> Result<()>;

    /// Time of the last successful load of `key`, if any
    fn last_loaded_at(&self, key: &ReloadKey) -> Option<Instant>;

    /// Floor on how often the same key may be reloaded
    fn min_reload_interval(&self) -> Duration;
}

/// Collects handlers before the registry is frozen
#[derive(Default)]
pub struct HandlerRegistryBuilder {
    handlers: HashMap<ResourceType, Arc<dyn ReloadHandler>>,
}

impl HandlerRegistryBuilder {
    #[must_use]
    pub fn register(mut self, resource: ResourceType, handler: Arc<dyn ReloadHandler>) -> Self {
        if self.handlers.insert(resource, handler).is_some() {
            tracing::warn!("Handler for {} registered twice, keeping the last one", resource);
        }
        self
    }

    #[must_use]
    pub fn build(self) -> HandlerRegistry {
        tracing::debug!("Reload registry built with {} handler(s)", self.handlers.len());
        HandlerRegistry {
            handlers: self.handlers,
        }
    }
}

/// Immutable resource type → handler map
pub struct HandlerRegistry {
    handlers: HashMap<ResourceType, Arc<dyn ReloadHandler>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    #[must_use]
    pub fn get(&self, resource: ResourceType) -> Option<&Arc<dyn ReloadHandler>> {
        self.handlers.get(&resource)
    }

    /// Registered resource types, sorted
    #[must_use]
    pub fn resources(&self) -> Vec<ResourceType> {
        let mut resources: Vec<_> = self.handlers.keys().copied().collect();
        resources.sort();
        resources
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
