// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Prelude module for convenient imports
//!
//! ```rust
//! use metadata_mirror::prelude::*;
//! ```

// Core types
pub use crate::config::Config;
pub use crate::error::{AppError, Result};

// Consumer API
pub use crate::cache::Entity;
pub use crate::metadata::MetadataHub;
pub use crate::platform::ResourceType;
pub use crate::scheduler::ReloadKey;

// Upstream client
pub use crate::platform::{CliTransport, EntitySource, PlatformClient, Transport};

// Metrics
pub use crate::metrics::MetricsRegistry;
