// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

mod health;
mod metadata;
mod metrics;

pub use health::health_check;
pub use metadata::{get_entity, list_entities, request_reload};
pub use metrics::metrics_handler;
