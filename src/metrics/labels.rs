//! Label types for Prometheus metrics

use prometheus_client::encoding::EncodeLabelSet;

use crate::platform::ResourceType;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ResourceLabels {
    pub resource: String,
}

impl ResourceLabels {
    #[must_use]
    pub fn new(resource: ResourceType) -> Self {
        Self {
            resource: resource.as_str().to_string(),
        }
    }
}
