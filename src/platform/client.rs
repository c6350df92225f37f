//! Paginated retry client for the platform API

use std::sync::Arc;
use std::time::Duration;

use super::slot::{ExecutionSlot, SlotStats};
use super::transport::Transport;
use crate::config::ApiConfig;
use crate::error::{AppError, Result};

/// Failure texts that mean the CLI session is gone
const AUTH_FAILURE_MARKERS: [&str; 5] = [
    "cf-invalidauthtoken",
    "cf-notauthenticated",
    "not logged in",
    "invalid_token",
    "token expired",
];

/// Error codes that mark an otherwise successful response body as a session failure
const AUTH_ERROR_CODES: [&str; 2] = ["CF-InvalidAuthToken", "CF-NotAuthenticated"];

/// Platform API client
///
/// Every clone shares the same transport and execution slot, so all remote
/// calls in the process are serialized no matter which cache issues them.
#[derive(Clone)]
pub struct PlatformClient {
    transport: Arc<dyn Transport>,
    slot: Arc<ExecutionSlot>,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl PlatformClient {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, config: &ApiConfig) -> Self {
        Self {
            transport,
            slot: Arc::new(ExecutionSlot::new()),
            retry_attempts: config.retry_attempts.max(1),
            retry_delay: config.retry_delay,
        }
    }

    /// Statistics of the shared execution slot
    #[must_use]
    pub fn stats(&self) -> SlotStats {
        self.slot.stats()
    }

    /// Performs one logical call, retrying transient failures
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Auth`] immediately on session expiry, or
    /// [`AppError::RetriesExhausted`] once the retry cap is reached.
    pub async fn fetch_one(&self, path: &str) -> Result<String> {
        let mut last_error = String::new();

        for attempt in 1..=self.retry_attempts {
            match self.call_once(path).await {
                Ok(body) => {
                    if attempt > 1 {
                        tracing::debug!("{} succeeded on attempt {}", path, attempt);
                    }
                    return Ok(body);
                }
                Err(e) if e.is_auth() => {
                    tracing::warn!("{} rejected, session needs re-authentication: {}", path, e);
                    return Err(e);
                }
                Err(e) => {
                    tracing::debug!(
                        "{} attempt {}/{} failed: {}",
                        path,
                        attempt,
                        self.retry_attempts,
                        e
                    );
                    last_error = e.to_string();
                    if attempt < self.retry_attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        Err(AppError::RetriesExhausted {
            path: path.to_string(),
            attempts: self.retry_attempts,
            last_error,
        })
    }

    /// Fetches every page of a collection
    ///
    /// `page_handler` parses each page body and returns the next-page path;
    /// `None` or an empty path ends the walk. Returns the number of pages read.
    ///
    /// # Errors
    ///
    /// Propagates the first `fetch_one` or `page_handler` error.
    pub async fn fetch_all<F>(&self, path: &str, mut page_handler: F) -> Result<usize>
    where
        F: FnMut(&str) -> Result<Option<String>> + Send,
    {
        let mut next = Some(path.to_string());
        let mut pages = 0;

        while let Some(current) = next.take() {
            let body = self.fetch_one(&current).await?;
            pages += 1;

            next = match page_handler(&body)? {
                Some(pointer) if pointer.trim().is_empty() => None,
                Some(pointer) if pointer == current => {
                    return Err(AppError::Parse(format!(
                        "next page of {current} points back to itself"
                    )));
                }
                other => other,
            };
            tracing::trace!("{} page {} read, next: {:?}", path, pages, next);
        }

        Ok(pages)
    }

    async fn call_once(&self, path: &str) -> Result<String> {
        let args = ["curl".to_string(), path.to_string()];

        let _permit = self.slot.acquire().await;
        let result = self
            .transport
            .call(&args)
            .await
            .map_err(classify_failure)
            .and_then(into_body);
        self.slot.record(result.is_ok());
        result
    }
}

/// Promotes failures whose text mentions an expired session to [`AppError::Auth`]
fn classify_failure(error: AppError) -> AppError {
    if error.is_auth() {
        return error;
    }
    let text = error.to_string();
    let lowered = text.to_ascii_lowercase();
    if AUTH_FAILURE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
    {
        AppError::Auth(text)
    } else {
        error
    }
}

fn into_body(lines: Vec<String>) -> Result<String> {
    let body = lines.join("\n");
    if body.trim().is_empty() {
        return Err(AppError::Transport("empty response".to_string()));
    }
    if let Some(code) = AUTH_ERROR_CODES.iter().find(|code| body.contains(**code)) {
        return Err(AppError::Auth(format!("API responded with {code}")));
    }
    Ok(body)
}
