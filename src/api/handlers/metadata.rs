// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Read and reload endpoints for cached metadata

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::api::AppState;
use crate::cache::Entity;
use crate::platform::ResourceType;
use crate::scheduler::ReloadKey;

#[derive(Debug, Serialize, Deserialize)]
pub struct EntityView {
    pub guid: String,
    pub name: String,
    pub resource: String,
    pub loaded: bool,
    pub last_loaded_secs_ago: Option<u64>,
    pub deleted: bool,
}

impl EntityView {
    fn new(entity: &Entity, deleted: bool) -> Self {
        Self {
            guid: entity.guid.clone(),
            name: entity.name.clone(),
            resource: entity.resource.to_string(),
            loaded: entity.is_loaded(),
            last_loaded_secs_ago: entity.last_loaded_at.map(|at| at.elapsed().as_secs()),
            deleted,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EntityList {
    pub resource: String,
    pub count: usize,
    pub entities: Vec<EntityView>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReloadParams {
    pub guid: Option<String>,
    pub delay_secs: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub resource: String,
    pub key: String,
    /// `false` when an equivalent or broader reload was already queued
    pub queued: bool,
}

fn parse_resource(raw: &str) -> Result<ResourceType, Response> {
    raw.parse::<ResourceType>().map_err(|e| {
        tracing::debug!("Rejecting metadata request: {}", e);
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response()
    })
}

/// GET /metadata/{resource}
pub async fn list_entities(
    State(state): State<Arc<AppState>>,
    Path(resource): Path<String>,
) -> Response {
    let resource = match parse_resource(&resource) {
        Ok(resource) => resource,
        Err(response) => return response,
    };
    let Some(cache) = state.metadata.cache(resource) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let snapshot = cache.snapshot();
    let mut entities: Vec<EntityView> = snapshot
        .values()
        .map(|entity| EntityView::new(entity, false))
        .collect();
    entities.sort_by(|a, b| a.guid.cmp(&b.guid));

    let list = EntityList {
        resource: resource.to_string(),
        count: entities.len(),
        entities,
    };
    (StatusCode::OK, Json(list)).into_response()
}

/// GET /metadata/{resource}/{guid}
///
/// Behaves like a consumer lookup: unseen GUIDs yield a placeholder and may
/// queue a load.
pub async fn get_entity(
    State(state): State<Arc<AppState>>,
    Path((resource, guid)): Path<(String, String)>,
) -> Response {
    let resource = match parse_resource(&resource) {
        Ok(resource) => resource,
        Err(response) => return response,
    };

    let entity = state.metadata.find(resource, &guid);
    let deleted = state.metadata.is_deleted(resource, &guid);
    (StatusCode::OK, Json(EntityView::new(&entity, deleted))).into_response()
}

/// POST /metadata/{resource}/reload?guid=&delay_secs=
pub async fn request_reload(
    State(state): State<Arc<AppState>>,
    Path(resource): Path<String>,
    Query(params): Query<ReloadParams>,
) -> Response {
    let resource = match parse_resource(&resource) {
        Ok(resource) => resource,
        Err(response) => return response,
    };

    let key = ReloadKey::from(params.guid);
    let delay = Duration::from_secs(params.delay_secs.unwrap_or(0));
    let queued = state.metadata.request_reload(resource, key.clone(), delay);
    tracing::info!(
        "Reload of {}/{} requested over HTTP (delay {:?}, queued: {})",
        resource,
        key,
        delay,
        queued
    );

    let response = ReloadResponse {
        resource: resource.to_string(),
        key: key.to_string(),
        queued,
    };
    (StatusCode::ACCEPTED, Json(response)).into_response()
}
