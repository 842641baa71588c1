//! Sentinel store - the shared station/status key-space
//!
//! This library owns the data contract between the monitoring service and
//! the dashboard server. Both sides talk to the same backend through the
//! [`StatusStore`] trait, backed by Redis in production and by an in-memory
//! map in tests.

pub mod catalog;
pub mod config;
pub mod connect;
pub mod error;
pub mod keys;
pub mod memory;
pub mod status;
pub mod store;
pub mod valkey;

// Re-export main types
pub use catalog::{CatalogError, StatusSnapshot, Summary, UrlStatus};
pub use config::{RetryPolicy, StoreConfig};
pub use connect::{Connector, connect, ensure_default_station};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use status::{DownReason, ParseStatusError, Status};
pub use store::StatusStore;
pub use valkey::{RedisConnector, RedisStore};

/// Station that always exists and cannot be deleted from the dashboard
pub const DEFAULT_STATION: &str = "General";
