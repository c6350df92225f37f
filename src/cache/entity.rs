// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Cached entity representation

use serde_json::Value;
use tokio::time::Instant;

use crate::platform::{RemoteEntity, ResourceType};

/// One cached platform entity
#[derive(Debug, Clone)]
pub struct Entity {
    pub resource: ResourceType,
    pub guid: String,
    pub name: String,
    /// Raw entity body as returned by the API
    pub attributes: Value,
    /// `None` until loaded from the API at least once
    pub last_loaded_at: Option<Instant>,
}

impl Entity {
    /// Stand-in for an entity that has not been loaded yet; the GUID doubles as its name
    #[must_use]
    pub fn placeholder(resource: ResourceType, guid: &str) -> Self {
        Self {
            resource,
            guid: guid.to_string(),
            name: guid.to_string(),
            attributes: Value::Null,
            last_loaded_at: None,
        }
    }

    #[must_use]
    pub fn from_remote(resource: ResourceType, remote: RemoteEntity, loaded_at: Instant) -> Self {
        Self {
            resource,
            guid: remote.guid,
            name: remote.name,
            attributes: remote.attributes,
            last_loaded_at: Some(loaded_at),
        }
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.last_loaded_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::remote;

    #[test]
    fn test_placeholder_uses_guid_as_name() {
        let entity = Entity::placeholder(ResourceType::Space, "s-9");
        assert_eq!(entity.name, "s-9");
        assert!(!entity.is_loaded());
        assert!(entity.attributes.is_null());
    }

    #[tokio::test(start_paused = true)]
    async fn test_from_remote_is_loaded() {
        let now = Instant::now();
        let entity = Entity::from_remote(ResourceType::App, remote("a-1", "web"), now);
        assert_eq!(entity.name, "web");
        assert_eq!(entity.last_loaded_at, Some(now));
        assert_eq!(entity.attributes["name"], "web");
    }
}
