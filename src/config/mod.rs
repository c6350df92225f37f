// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Configuration module for the metadata mirror
//!
//! Loads configuration from environment variables (optionally via `.env`).

use std::time::Duration;

use crate::platform::ResourceType;


/// Default configuration values
pub mod defaults {
    pub const SERVER_ADDR: &str = "0.0.0.0:9090";
    pub const CF_COMMAND: &str = "cf";
    pub const API_CALL_TIMEOUT_SECS: u64 = 30;
    pub const API_RETRY_ATTEMPTS: u32 = 5;
    pub const API_RETRY_DELAY_MS: u64 = 1000;
    pub const RELOAD_MAX_ATTEMPTS: u32 = 5;
    pub const RELOAD_RETRY_DELAY_SECS: u64 = 30;
    pub const MIN_RELOAD_INTERVAL_SECS: u64 = 10;
    pub const DELETE_GRACE_SECS: u64 = 15;
    pub const PRELOAD_RESOURCES: &str = "orgs,spaces,apps";
}

/// Environment variable names used by the application
pub mod env_vars {
    pub const SERVER_ADDR: &str = "SERVER_ADDR";
    pub const CF_COMMAND: &str = "CF_COMMAND";
    pub const API_CALL_TIMEOUT_SECONDS: &str = "API_CALL_TIMEOUT_SECONDS";
    pub const API_RETRY_ATTEMPTS: &str = "API_RETRY_ATTEMPTS";
    pub const API_RETRY_DELAY_MS: &str = "API_RETRY_DELAY_MS";
    pub const RELOAD_MAX_ATTEMPTS: &str = "RELOAD_MAX_ATTEMPTS";
    pub const RELOAD_RETRY_DELAY_SECONDS: &str = "RELOAD_RETRY_DELAY_SECONDS";
    pub const MIN_RELOAD_INTERVAL_SECONDS: &str = "MIN_RELOAD_INTERVAL_SECONDS";
    pub const DELETE_GRACE_SECONDS: &str = "DELETE_GRACE_SECONDS";
    pub const PRELOAD_RESOURCES: &str = "PRELOAD_RESOURCES";
}

/// Settings for the paginated retry client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Executable invoked as `<command> curl <path>`
    pub command: String,
    pub call_timeout: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            command: defaults::CF_COMMAND.to_string(),
            call_timeout: Duration::from_secs(defaults::API_CALL_TIMEOUT_SECS),
            retry_attempts: defaults::API_RETRY_ATTEMPTS,
            retry_delay: Duration::from_millis(defaults::API_RETRY_DELAY_MS),
        }
    }
}

/// Settings for the reload scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::RELOAD_MAX_ATTEMPTS,
            retry_delay: Duration::from_secs(defaults::RELOAD_RETRY_DELAY_SECS),
        }
    }
}

/// Settings shared by every entity cache manager
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub min_reload_interval: Duration,
    pub delete_grace: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            min_reload_interval: Duration::from_secs(defaults::MIN_RELOAD_INTERVAL_SECS),
            delete_grace: Duration::from_secs(defaults::DELETE_GRACE_SECS),
        }
    }
}

/// Application-wide configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub api: ApiConfig,
    pub scheduler: SchedulerConfig,
    pub cache: CacheConfig,
    /// Collections requested in full right after startup
    pub preload: Vec<ResourceType>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_addr: defaults::SERVER_ADDR.to_string(),
            api: ApiConfig::default(),
            scheduler: SchedulerConfig::default(),
            cache: CacheConfig::default(),
            preload: parse_resource_list(defaults::PRELOAD_RESOURCES),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let server_addr = std::env::var(env_vars::SERVER_ADDR)
            .unwrap_or_else(|_| defaults::SERVER_ADDR.to_string());

        let api = ApiConfig {
            command: std::env::var(env_vars::CF_COMMAND)
                .unwrap_or_else(|_| defaults::CF_COMMAND.to_string()),
            call_timeout: Duration::from_secs(env_or(
                env_vars::API_CALL_TIMEOUT_SECONDS,
                defaults::API_CALL_TIMEOUT_SECS,
            )),
            retry_attempts: env_or(env_vars::API_RETRY_ATTEMPTS, defaults::API_RETRY_ATTEMPTS),
            retry_delay: Duration::from_millis(env_or(
                env_vars::API_RETRY_DELAY_MS,
                defaults::API_RETRY_DELAY_MS,
            )),
        };

        let scheduler = SchedulerConfig {
            max_attempts: env_or(env_vars::RELOAD_MAX_ATTEMPTS, defaults::RELOAD_MAX_ATTEMPTS),
            retry_delay: Duration::from_secs(env_or(
                env_vars::RELOAD_RETRY_DELAY_SECONDS,
                defaults::RELOAD_RETRY_DELAY_SECS,
            )),
        };

        let cache = CacheConfig {
            min_reload_interval: Duration::from_secs(env_or(
                env_vars::MIN_RELOAD_INTERVAL_SECONDS,
                defaults::MIN_RELOAD_INTERVAL_SECS,
            )),
            delete_grace: Duration::from_secs(env_or(
                env_vars::DELETE_GRACE_SECONDS,
                defaults::DELETE_GRACE_SECS,
            )),
        };

        let preload = parse_resource_list(
            &std::env::var(env_vars::PRELOAD_RESOURCES)
                .unwrap_or_else(|_| defaults::PRELOAD_RESOURCES.to_string()),
        );

        let config = Config {
            server_addr,
            api,
            scheduler,
            cache,
            preload,
        };

        if let Err(e) = config.validate() {
            tracing::error!("Invalid configuration: {}", e);
            tracing::warn!("Falling back to defaults for invalid settings");
            return config.sanitized();
        }

        config
    }

    /// Validates settings that would stall or disable the reload machinery
    pub fn validate(&self) -> Result<(), String> {
        if self.api.command.trim().is_empty() {
            return Err("CLI command cannot be empty".to_string());
        }
        if self.api.retry_attempts == 0 {
            return Err("API retry attempts must be at least 1".to_string());
        }
        if self.api.call_timeout.is_zero() {
            return Err("API call timeout must be greater than zero".to_string());
        }
        if self.scheduler.max_attempts == 0 {
            return Err("Reload max attempts must be at least 1".to_string());
        }
        Ok(())
    }

    fn sanitized(mut self) -> Self {
        let api_defaults = ApiConfig::default();
        if self.api.command.trim().is_empty() {
            self.api.command = api_defaults.command;
        }
        if self.api.retry_attempts == 0 {
            self.api.retry_attempts = api_defaults.retry_attempts;
        }
        if self.api.call_timeout.is_zero() {
            self.api.call_timeout = api_defaults.call_timeout;
        }
        if self.scheduler.max_attempts == 0 {
            self.scheduler.max_attempts = defaults::RELOAD_MAX_ATTEMPTS;
        }
        self
    }
}

/// Reads and parses an environment variable, logging and falling back on bad input
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            tracing::warn!("Failed to parse {}='{}'. Using default.", name, raw);
            default
        }),
        Err(_) => default,
    }
}

/// Parses a comma-separated list of resource names, skipping unknown ones
pub fn parse_resource_list(raw: &str) -> Vec<ResourceType> {
    let mut resources = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match name.parse::<ResourceType>() {
            Ok(resource) if !resources.contains(&resource) => resources.push(resource),
            Ok(_) => {}
            Err(e) => tracing::warn!("Skipping preload entry: {}", e),
        }
    }
    resources
}
