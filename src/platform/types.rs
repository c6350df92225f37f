// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Resource types and the generic wire shapes of the platform API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, Result};

/// Results requested per collection page
pub const PAGE_SIZE: usize = 100;

/// API generation a resource is served from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    V2,
    V3,
}

/// Platform resource kinds mirrored by the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    App,
    Space,
    Org,
    Route,
    Domain,
    OrgQuota,
    SpaceQuota,
    IsolationSegment,
    Stack,
}

impl ResourceType {
    /// Every resource type, in registry order
    pub const ALL: [ResourceType; 9] = [
        ResourceType::App,
        ResourceType::Space,
        ResourceType::Org,
        ResourceType::Route,
        ResourceType::Domain,
        ResourceType::OrgQuota,
        ResourceType::SpaceQuota,
        ResourceType::IsolationSegment,
        ResourceType::Stack,
    ];

    /// Canonical tag used in logs, metrics labels and HTTP paths
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::App => "apps",
            ResourceType::Space => "spaces",
            ResourceType::Org => "orgs",
            ResourceType::Route => "routes",
            ResourceType::Domain => "domains",
            ResourceType::OrgQuota => "quotas",
            ResourceType::SpaceQuota => "space_quotas",
            ResourceType::IsolationSegment => "isolation_segments",
            ResourceType::Stack => "stacks",
        }
    }

    #[must_use]
    pub fn api_version(&self) -> ApiVersion {
        match self {
            ResourceType::IsolationSegment => ApiVersion::V3,
            _ => ApiVersion::V2,
        }
    }

    fn endpoint(&self) -> &'static str {
        match self {
            ResourceType::App => "/v2/apps",
            ResourceType::Space => "/v2/spaces",
            ResourceType::Org => "/v2/organizations",
            ResourceType::Route => "/v2/routes",
            ResourceType::Domain => "/v2/domains",
            ResourceType::OrgQuota => "/v2/quota_definitions",
            ResourceType::SpaceQuota => "/v2/space_quota_definitions",
            ResourceType::IsolationSegment => "/v3/isolation_segments",
            ResourceType::Stack => "/v2/stacks",
        }
    }

    /// First page of the full collection
    #[must_use]
    pub fn collection_path(&self) -> String {
        match self.api_version() {
            ApiVersion::V2 => format!("{}?results-per-page={PAGE_SIZE}", self.endpoint()),
            ApiVersion::V3 => format!("{}?per_page={PAGE_SIZE}", self.endpoint()),
        }
    }

    /// Single-entity detail endpoint
    #[must_use]
    pub fn item_path(&self, guid: &str) -> String {
        format!("{}/{}", self.endpoint(), guid)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let resource = match s.trim().to_ascii_lowercase().as_str() {
            "app" | "apps" | "application" | "applications" => ResourceType::App,
            "space" | "spaces" => ResourceType::Space,
            "org" | "orgs" | "organization" | "organizations" => ResourceType::Org,
            "route" | "routes" => ResourceType::Route,
            "domain" | "domains" => ResourceType::Domain,
            "quota" | "quotas" | "quota_definitions" => ResourceType::OrgQuota,
            "space_quota" | "space_quotas" | "space_quota_definitions" => {
                ResourceType::SpaceQuota
            }
            "isolation_segment" | "isolation_segments" | "segments" => {
                ResourceType::IsolationSegment
            }
            "stack" | "stacks" => ResourceType::Stack,
            _ => return Err(AppError::UnknownResource(s.to_string())),
        };
        Ok(resource)
    }
}

/// One entity as reported by the API
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEntity {
    pub guid: String,
    /// Empty when the API no longer knows the entity
    pub name: String,
    pub attributes: Value,
}

impl RemoteEntity {
    fn from_attributes(resource: ResourceType, guid: String, attributes: Map<String, Value>) -> Self {
        let name = display_name(resource, &attributes).unwrap_or_else(|| guid.clone());
        Self {
            guid,
            name,
            attributes: Value::Object(attributes),
        }
    }

    /// Deletion signal for a GUID the API reported as not found
    #[must_use]
    pub fn gone(guid: &str) -> Self {
        Self {
            guid: guid.to_string(),
            name: String::new(),
            attributes: Value::Null,
        }
    }

    #[must_use]
    pub fn is_gone(&self) -> bool {
        self.name.is_empty()
    }
}

/// Human-readable name of an entity body
///
/// Routes have no `name`; they are named by host and path, or by port for TCP routes.
fn display_name(resource: ResourceType, attributes: &Map<String, Value>) -> Option<String> {
    if resource != ResourceType::Route {
        return non_empty(attributes, "name").map(str::to_string);
    }

    let path = non_empty(attributes, "path").unwrap_or_default();
    if let Some(host) = non_empty(attributes, "host") {
        return Some(format!("{host}{path}"));
    }
    match attributes.get("port").and_then(Value::as_u64) {
        Some(port) => Some(format!(":{port}{path}")),
        None => non_empty(attributes, "path").map(str::to_string),
    }
}

fn non_empty<'a>(attributes: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    attributes
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

/// Error payload the API returns in place of a resource
#[derive(Debug, PartialEq)]
struct UpstreamError {
    code: String,
    detail: String,
}

impl UpstreamError {
    /// Extracts the v2 `error_code` or the first v3 `errors[]` entry
    fn from_body(body: &Map<String, Value>) -> Option<Self> {
        let text = |value: Option<&Value>| {
            value
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        if let Some(code) = body.get("error_code").and_then(Value::as_str) {
            return Some(Self {
                code: code.to_string(),
                detail: text(body.get("description")),
            });
        }

        let first = body.get("errors")?.as_array()?.first()?;
        Some(Self {
            code: text(first.get("title")),
            detail: text(first.get("detail")),
        })
    }

    fn is_not_found(&self) -> bool {
        self.code.ends_with("NotFound")
    }

    fn into_error(self, path: &str) -> AppError {
        AppError::Transport(format!("{path} answered {}: {}", self.code, self.detail))
    }
}

#[derive(Debug, Default, Deserialize)]
struct V2Metadata {
    #[serde(default)]
    guid: String,
}

#[derive(Debug, Deserialize)]
struct V2Resource {
    #[serde(default)]
    metadata: V2Metadata,
    entity: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct V2Page {
    #[serde(default)]
    next_url: Option<String>,
    resources: Vec<V2Resource>,
}

#[derive(Debug, Default, Deserialize)]
struct V3Link {
    #[serde(default)]
    href: String,
}

#[derive(Debug, Default, Deserialize)]
struct V3Pagination {
    #[serde(default)]
    next: Option<V3Link>,
}

#[derive(Debug, Deserialize)]
struct V3Page {
    #[serde(default)]
    pagination: V3Pagination,
    resources: Vec<Map<String, Value>>,
}

/// Parses one collection page, returning its entities and the next-page path
///
/// Error payloads fail the page, so a throttled or broken listing never
/// passes for an empty collection.
pub fn parse_page(resource: ResourceType, body: &str) -> Result<(Vec<RemoteEntity>, Option<String>)> {
    let body: Map<String, Value> = serde_json::from_str(body)?;
    if let Some(error) = UpstreamError::from_body(&body) {
        return Err(error.into_error(&resource.collection_path()));
    }

    match resource.api_version() {
        ApiVersion::V2 => {
            let page: V2Page = serde_json::from_value(Value::Object(body))?;
            let entities = page
                .resources
                .into_iter()
                .filter(|r| !r.metadata.guid.is_empty())
                .map(|r| RemoteEntity::from_attributes(resource, r.metadata.guid, r.entity))
                .collect();
            Ok((entities, page.next_url.and_then(|url| relative_path(&url))))
        }
        ApiVersion::V3 => {
            let page: V3Page = serde_json::from_value(Value::Object(body))?;
            let entities = page
                .resources
                .into_iter()
                .filter_map(|attrs| {
                    let guid = attrs.get("guid").and_then(Value::as_str)?.to_string();
                    Some(RemoteEntity::from_attributes(resource, guid, attrs))
                })
                .collect();
            let next = page
                .pagination
                .next
                .and_then(|link| relative_path(&link.href));
            Ok((entities, next))
        }
    }
}

/// Parses a single-entity response.
///
/// Only a `*NotFound` error code yields [`RemoteEntity::gone`]; any other
/// error payload is a transport failure the caller may retry.
pub fn parse_item(resource: ResourceType, guid: &str, body: &str) -> Result<RemoteEntity> {
    let body: Map<String, Value> = serde_json::from_str(body)?;
    if let Some(error) = UpstreamError::from_body(&body) {
        if error.is_not_found() {
            return Ok(RemoteEntity::gone(guid));
        }
        return Err(error.into_error(&resource.item_path(guid)));
    }

    let attributes = match resource.api_version() {
        ApiVersion::V2 => serde_json::from_value::<V2Resource>(Value::Object(body))?.entity,
        ApiVersion::V3 => body,
    };
    Ok(RemoteEntity::from_attributes(resource, guid.to_string(), attributes))
}

/// Reduces an absolute link to the path form the CLI expects
fn relative_path(link: &str) -> Option<String> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }
    match link.find("://") {
        Some(scheme_end) => {
            let rest = &link[scheme_end + 3..];
            rest.find('/').map(|slash| rest[slash..].to_string())
        }
        None => Some(link.to_string()),
    }
}
