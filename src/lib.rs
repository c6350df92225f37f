// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! # Metadata Mirror
//!
//! Local, continuously refreshed mirror of platform resource metadata
//! (applications, spaces, organizations, routes, domains, quotas, isolation
//! segments, stacks) fetched through a slow, paginated CLI-backed API.
//!
//! ## Main modules
//! - `api`: HTTP API handlers
//! - `cache`: per-resource-type entity caches
//! - `config`: configuration management
//! - `error`: error types
//! - `metadata`: consumer-facing hub
//! - `metrics`: Prometheus metrics registry
//! - `platform`: upstream API client and transport
//! - `scheduler`: reload queue and worker
//! - `prelude`: commonly used types and traits

mod api;
mod cache;
mod config;
mod error;
mod metadata;
mod metrics;
mod platform;
mod scheduler;
pub mod prelude;

// Re-export commonly used types
/// Application configuration
pub use config::{ApiConfig, CacheConfig, Config, SchedulerConfig, parse_resource_list};

/// Application error and result type
pub use error::{AppError, Result};

/// HTTP API router and state
pub use api::{AppState, create_router};

/// Entity caches
pub use cache::{CacheStats, Entity, EntityCache, EntryMap, MissPolicy};

/// Consumer-facing hub
pub use metadata::MetadataHub;

/// Metrics registry and labels
pub use metrics::{MetricsRegistry, ResourceLabels};

/// Upstream API client, transports and resource types
pub use platform::{
    ApiVersion, CliTransport, EntitySource, ExecutionSlot, PAGE_SIZE, PlatformClient,
    RemoteEntity, ResourceType, SlotStats, Transport, parse_item, parse_page,
};

/// Reload scheduling
pub use scheduler::{
    HandlerRegistry, HandlerRegistryBuilder, Outcome, ReloadHandler, ReloadKey, ReloadQueue,
    ReloadRequest, ReloadScheduler,
};
