use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::status::Status;

/// Typed access to the station/URL/status key-space
///
/// Every call is a round-trip to the backend. Nothing is cached, since the
/// monitoring service and the dashboard read each other's writes.
///
/// # Implementations
///
/// - `RedisStore`: Redis or Valkey through a `ConnectionManager`
/// - `MemoryStore`: in-process maps, used by tests
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Round-trip liveness check (`PING`)
    async fn ping(&self) -> Result<(), StoreError>;

    /// Non-failing variant of [`StatusStore::ping`] for readers
    async fn is_healthy(&self) -> bool {
        self.ping().await.is_ok()
    }

    async fn list_stations(&self) -> Result<HashSet<String>, StoreError>;

    async fn list_urls(&self, station: &str) -> Result<HashSet<String>, StoreError>;

    /// Current status of `url`, `Status::Pending` when no value is stored
    async fn get_status(&self, url: &str) -> Result<Status, StoreError>;

    async fn set_status(&self, url: &str, status: &Status) -> Result<(), StoreError>;

    async fn delete_status(&self, url: &str) -> Result<(), StoreError>;

    /// Returns `true` if the station was not already present
    async fn add_station(&self, name: &str) -> Result<bool, StoreError>;

    /// Removes the station and its URL set. Returns `true` if it existed.
    async fn remove_station(&self, name: &str) -> Result<bool, StoreError>;

    /// Returns `true` if the URL was not already in the station
    async fn add_url(&self, station: &str, url: &str) -> Result<bool, StoreError>;

    /// Returns `true` if the URL was in the station
    async fn remove_url(&self, station: &str, url: &str) -> Result<bool, StoreError>;
}
