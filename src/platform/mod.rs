//! Platform API access module
//!
//! Executes remote calls through the platform CLI, serializes them through a
//! single execution slot, follows pagination and retries transient failures.

mod client;
mod slot;
mod source;
mod transport;
mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export public types and functions
pub use client::PlatformClient;
pub use slot::{ExecutionSlot, SlotStats};
pub use source::EntitySource;
pub use transport::{CliTransport, Transport};
pub use types::{ApiVersion, PAGE_SIZE, RemoteEntity, ResourceType, parse_item, parse_page};
