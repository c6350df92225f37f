// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Scripted transport and entity source for unit tests

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use super::source::EntitySource;
use super::transport::Transport;
use super::types::{RemoteEntity, ResourceType};
use crate::error::{AppError, Result};

/// Transport replaying queued responses in order
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Vec<String>>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, body: &str) {
        let lines = body.lines().map(str::to_string).collect();
        self.responses.lock().unwrap().push_back(Ok(lines));
    }

    pub fn push_err(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(AppError::Transport(message.to_string())));
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requested_paths(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn call(&self, args: &[String]) -> Result<Vec<String>> {
        self.requests
            .lock()
            .unwrap()
            .push(args.last().cloned().unwrap_or_default());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::Transport("script exhausted".to_string())))
    }
}

/// What a [`FakeSource`] answers for one entity
#[derive(Clone)]
pub enum Reply {
    Name(String),
    Gone,
    Fail,
}

/// Entity source with programmable per-guid replies and call counting
#[derive(Default)]
pub struct FakeSource {
    items: Mutex<HashMap<String, Reply>>,
    collection: Mutex<Option<Vec<RemoteEntity>>>,
    item_calls: Mutex<Vec<String>>,
    collection_calls: Mutex<usize>,
    latency: Mutex<Duration>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_item(&self, guid: &str, reply: Reply) {
        self.items.lock().unwrap().insert(guid.to_string(), reply);
    }

    pub fn set_collection(&self, entities: &[(&str, &str)]) {
        let list = entities
            .iter()
            .map(|(guid, name)| remote(guid, name))
            .collect();
        *self.collection.lock().unwrap() = Some(list);
    }

    pub fn fail_collection(&self) {
        *self.collection.lock().unwrap() = None;
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn item_calls(&self, guid: &str) -> usize {
        self.item_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|g| g.as_str() == guid)
            .count()
    }

    pub fn collection_calls(&self) -> usize {
        *self.collection_calls.lock().unwrap()
    }
}

pub fn remote(guid: &str, name: &str) -> RemoteEntity {
    RemoteEntity {
        guid: guid.to_string(),
        name: name.to_string(),
        attributes: serde_json::json!({ "name": name }),
    }
}

#[async_trait]
impl EntitySource for FakeSource {
    async fn fetch_entity(&self, _resource: ResourceType, guid: &str) -> Result<RemoteEntity> {
        self.item_calls.lock().unwrap().push(guid.to_string());
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let reply = self.items.lock().unwrap().get(guid).cloned();
        match reply {
            Some(Reply::Name(name)) => Ok(remote(guid, &name)),
            Some(Reply::Gone) => Ok(RemoteEntity::gone(guid)),
            Some(Reply::Fail) | None => Err(AppError::Transport(format!("no reply for {guid}"))),
        }
    }

    async fn fetch_collection(&self, _resource: ResourceType) -> Result<Vec<RemoteEntity>> {
        *self.collection_calls.lock().unwrap() += 1;
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.collection
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AppError::Transport("collection unavailable".to_string()))
    }
}
