// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Remote call transport
//!
//! The platform API is reached by executing the platform CLI (`cf curl <path>`),
//! which prints the response body to stdout. Calls go through
//! [`super::ExecutionSlot`]; the CLI must never run twice at once.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{AppError, Result};

/// Executes one remote call and returns the raw output lines
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, args: &[String]) -> Result<Vec<String>>;
}

/// Transport backed by the platform CLI binary
pub struct CliTransport {
    command: String,
    call_timeout: Duration,
}

impl CliTransport {
    #[must_use]
    pub fn new(command: impl Into<String>, call_timeout: Duration) -> Self {
        Self {
            command: command.into(),
            call_timeout,
        }
    }
}

#[async_trait]
impl Transport for CliTransport {
    async fn call(&self, args: &[String]) -> Result<Vec<String>> {
        tracing::trace!("Executing {} {}", self.command, args.join(" "));

        let child = Command::new(&self.command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = timeout(self.call_timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                AppError::Transport(format!(
                    "{} {} timed out after {:?}",
                    self.command,
                    args.join(" "),
                    self.call_timeout
                ))
            })??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(AppError::Transport(format!(
                "{} exited with {}: {}",
                self.command, output.status, detail
            )));
        }

        Ok(stdout.lines().map(str::to_string).collect())
    }
}
