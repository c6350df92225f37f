// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Resource-level loading on top of the paginated retry client

use async_trait::async_trait;

use super::client::PlatformClient;
use super::types::{RemoteEntity, ResourceType, parse_item, parse_page};
use crate::error::Result;

/// Where entity cache managers get their data from
#[async_trait]
pub trait EntitySource: Send + Sync {
    /// Loads one entity; [`RemoteEntity::is_gone`] when the API no longer knows it
    async fn fetch_entity(&self, resource: ResourceType, guid: &str) -> Result<RemoteEntity>;

    /// Loads the complete collection of a resource type
    async fn fetch_collection(&self, resource: ResourceType) -> Result<Vec<RemoteEntity>>;
}

#[async_trait]
impl EntitySource for PlatformClient {
    async fn fetch_entity(&self, resource: ResourceType, guid: &str) -> Result<RemoteEntity> {
        let body = self.fetch_one(&resource.item_path(guid)).await?;
        parse_item(resource, guid, &body)
    }

    async fn fetch_collection(&self, resource: ResourceType) -> Result<Vec<RemoteEntity>> {
        let mut entities = Vec::new();
        let pages = self
            .fetch_all(&resource.collection_path(), |body| {
                let (page, next) = parse_page(resource, body)?;
                entities.extend(page);
                Ok(next)
            })
            .await?;

        tracing::debug!(
            "Fetched {} {} across {} page(s)",
            entities.len(),
            resource,
            pages
        );
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::error::AppError;
    use crate::platform::testing::ScriptedTransport;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_fetch_collection_walks_v2_pages() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(
            r#"{"next_url": "/v2/spaces?page=2&results-per-page=100",
                "resources": [{"metadata": {"guid": "s-1"}, "entity": {"name": "dev"}}]}"#,
        );
        transport.push_ok(
            r#"{"next_url": null,
                "resources": [{"metadata": {"guid": "s-2"}, "entity": {"name": "prod"}}]}"#,
        );

        let client = PlatformClient::new(transport.clone(), &ApiConfig::default());
        let spaces = client.fetch_collection(ResourceType::Space).await.unwrap();

        let names: Vec<_> = spaces.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["dev", "prod"]);
        assert_eq!(
            transport.requested_paths(),
            vec![
                "/v2/spaces?results-per-page=100",
                "/v2/spaces?page=2&results-per-page=100"
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_entity_reports_missing_as_empty_name() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(r#"{"error_code": "CF-AppNotFound", "code": 100004}"#);

        let client = PlatformClient::new(transport.clone(), &ApiConfig::default());
        let entity = client
            .fetch_entity(ResourceType::App, "gone-1")
            .await
            .unwrap();

        assert_eq!(entity.guid, "gone-1");
        assert!(entity.is_gone());
        assert_eq!(transport.requested_paths(), vec!["/v2/apps/gone-1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_entity_rate_limited_is_error() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(
            r#"{"code": 10013, "description": "Rate Limit Exceeded", "error_code": "CF-RateLimitExceeded"}"#,
        );

        let client = PlatformClient::new(transport.clone(), &ApiConfig::default());
        let err = client
            .fetch_entity(ResourceType::App, "a-1")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("CF-RateLimitExceeded"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_collection_fails_on_error_page() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(
            r#"{"next_url": "/v2/organizations?page=2&results-per-page=100",
                "resources": [{"metadata": {"guid": "o-1"}, "entity": {"name": "platform"}}]}"#,
        );
        transport.push_ok(r#"{"code": 10001, "description": "An unknown error occurred.", "error_code": "UnknownError"}"#);

        let client = PlatformClient::new(transport.clone(), &ApiConfig::default());
        let result = client.fetch_collection(ResourceType::Org).await;

        assert!(matches!(result, Err(AppError::Transport(_))));
        assert_eq!(transport.calls(), 2);
    }
}
