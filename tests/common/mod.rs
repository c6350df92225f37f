// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

#![allow(dead_code)]

use async_trait::async_trait;
use metadata_mirror::{AppError, Result, Transport};
use std::collections::HashMap;
use std::sync::Mutex;

/// Transport answering by request path, counting every call
#[derive(Default)]
pub struct RoutedTransport {
    routes: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
}

#[derive(Clone)]
enum Reply {
    Body(String),
    Failure(String),
}

impl RoutedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, path: &str, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Reply::Body(body.to_string()));
    }

    pub fn fail(&self, path: &str, message: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Reply::Failure(message.to_string()));
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.as_str() == path)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for RoutedTransport {
    async fn call(&self, args: &[String]) -> Result<Vec<String>> {
        let path = args.last().cloned().unwrap_or_default();
        self.calls.lock().unwrap().push(path.clone());
        let reply = self.routes.lock().unwrap().get(&path).cloned();
        match reply {
            Some(Reply::Body(body)) => Ok(body.lines().map(str::to_string).collect()),
            Some(Reply::Failure(message)) => Err(AppError::Transport(message)),
            None => Err(AppError::Transport(format!("404 Not Found: {path}"))),
        }
    }
}

/// v2 single-entity body
pub fn v2_entity(guid: &str, name: &str) -> String {
    format!(r#"{{"metadata": {{"guid": "{guid}"}}, "entity": {{"name": "{name}"}}}}"#)
}

/// v2 collection page with an optional next link
pub fn v2_page(entities: &[(&str, &str)], next_url: Option<&str>) -> String {
    let resources: Vec<String> = entities
        .iter()
        .map(|(guid, name)| v2_entity(guid, name))
        .collect();
    let next = next_url.map_or("null".to_string(), |url| format!("\"{url}\""));
    format!(
        r#"{{"next_url": {next}, "resources": [{}]}}"#,
        resources.join(", ")
    )
}
