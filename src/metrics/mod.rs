// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Prometheus metrics for reloads, caches and the upstream API

mod labels;
mod registry;

/// Labels for per-resource-type metrics
pub use labels::ResourceLabels;

/// Prometheus metrics registry
pub use registry::MetricsRegistry;
