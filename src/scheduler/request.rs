// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Reload request types

use std::fmt;
use tokio::time::Instant;

use crate::platform::ResourceType;

/// What a reload request targets
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReloadKey {
    /// The entire collection of the resource type
    All,
    /// One entity by GUID
    Guid(String),
}

impl ReloadKey {
    #[must_use]
    pub fn guid(guid: impl Into<String>) -> Self {
        ReloadKey::Guid(guid.into())
    }

    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, ReloadKey::All)
    }
}

impl From<Option<String>> for ReloadKey {
    fn from(guid: Option<String>) -> Self {
        match guid {
            Some(guid) if !guid.trim().is_empty() => ReloadKey::Guid(guid),
            _ => ReloadKey::All,
        }
    }
}

impl fmt::Display for ReloadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReloadKey::All => f.write_str("ALL"),
            ReloadKey::Guid(guid) => f.write_str(guid),
        }
    }
}

/// A pending reload
#[derive(Debug, Clone)]
pub struct ReloadRequest {
    pub resource: ResourceType,
    pub key: ReloadKey,
    /// Earliest time the request may execute
    pub not_before: Instant,
    /// Failed executions so far
    pub attempts: u32,
}

impl ReloadRequest {
    #[must_use]
    pub fn new(resource: ResourceType, key: ReloadKey, not_before: Instant) -> Self {
        Self {
            resource,
            key,
            not_before,
            attempts: 0,
        }
    }

    /// Whether executing `self` makes `other` redundant
    #[must_use]
    pub fn supersedes(&self, other: &ReloadRequest) -> bool {
        self.resource == other.resource && (self.key.is_all() || self.key == other.key)
    }

    #[must_use]
    pub fn is_ready(&self, now: Instant) -> bool {
        self.not_before <= now
    }
}

impl fmt::Display for ReloadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource, self.key)
    }
}
