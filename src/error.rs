//! Error types for the metadata mirror

use thiserror::Error;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network or IO error
    #[error("IO error")]
    Io(#[from] std::io::Error),

    /// Address parsing error
    #[error("Address parse error")]
    AddrParse(#[from] std::net::AddrParseError),

    /// Remote call failed (non-zero exit, timeout, empty output)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Session expired or not logged in; retrying cannot help
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Remote call kept failing until the retry cap was reached
    #[error("Request {path} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        path: String,
        attempts: u32,
        last_error: String,
    },

    /// Response body could not be interpreted
    #[error("Parse error: {0}")]
    Parse(String),

    /// Resource type tag not known to the registry
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// Metrics encoding error
    #[error("Metrics error: {0}")]
    Metrics(String),
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse(error.to_string())
    }
}

impl AppError {
    /// Whether the failure is a session problem rather than a transient one
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

/// Convenient alias for Result with application error
pub type Result<T> = std::result::Result<T, AppError>;
