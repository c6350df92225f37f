//! Application state shared across HTTP handlers

use std::sync::Arc;

use crate::config::Config;
use crate::metadata::MetadataHub;
use crate::metrics::MetricsRegistry;
use crate::platform::PlatformClient;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub metrics: MetricsRegistry,
    pub metadata: Arc<MetadataHub>,
    /// Kept for its call statistics
    pub client: PlatformClient,
}
