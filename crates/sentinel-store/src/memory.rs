//! In-memory status store

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::connect::Connector;
use crate::error::StoreError;
use crate::keys;
use crate::status::Status;
use crate::store::StatusStore;

/// In-memory status store
///
/// Data is kept under the same keys the Redis backend uses, so tests can
/// assert on the raw key-space. Clones share the same data.
///
/// The store can be switched offline, after which every operation fails
/// with `StoreError::Connection` until it is brought back.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<Data>>,
    offline: Arc<AtomicBool>,
    connections: Arc<AtomicUsize>,
}

#[derive(Debug, Default)]
struct Data {
    sets: HashMap<String, HashSet<String>>,
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing (or regaining) the backend
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    /// Number of successful `Connector::open` calls so far
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Raw scalar lookup by full key
    pub async fn raw_value(&self, key: &str) -> Option<String> {
        self.data.read().await.values.get(key).cloned()
    }

    /// Raw scalar write by full key, bypassing status parsing
    pub async fn set_raw_value(&self, key: &str, value: &str) {
        self.data.write().await.values.insert(key.to_string(), value.to_string());
    }

    /// Raw set members by full key
    pub async fn raw_members(&self, key: &str) -> HashSet<String> {
        self.data.read().await.sets.get(key).cloned().unwrap_or_default()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.is_offline() {
            Err(StoreError::Connection("memory store is offline".into()))
        } else {
            Ok(())
        }
    }

    async fn sadd(&self, key: String, member: &str) -> Result<bool, StoreError> {
        self.check_online()?;
        let mut data = self.data.write().await;
        Ok(data.sets.entry(key).or_default().insert(member.to_string()))
    }

    async fn srem(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.check_online()?;
        let mut data = self.data.write().await;
        let Some(set) = data.sets.get_mut(key) else {
            return Ok(false);
        };
        let removed = set.remove(member);
        // Redis drops a set once its last member is gone
        if set.is_empty() {
            data.sets.remove(key);
        }
        Ok(removed)
    }

    async fn smembers(&self, key: &str) -> Result<HashSet<String>, StoreError> {
        self.check_online()?;
        Ok(self.raw_members(key).await)
    }
}

#[async_trait]
impl StatusStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.check_online()
    }

    async fn list_stations(&self) -> Result<HashSet<String>, StoreError> {
        self.smembers(keys::STATIONS).await
    }

    async fn list_urls(&self, station: &str) -> Result<HashSet<String>, StoreError> {
        self.smembers(&keys::urls(station)).await
    }

    async fn get_status(&self, url: &str) -> Result<Status, StoreError> {
        self.check_online()?;
        match self.raw_value(&keys::status(url)).await {
            Some(raw) => Ok(raw.parse()?),
            None => Ok(Status::Pending),
        }
    }

    async fn set_status(&self, url: &str, status: &Status) -> Result<(), StoreError> {
        self.check_online()?;
        self.set_raw_value(&keys::status(url), &status.to_string()).await;
        Ok(())
    }

    async fn delete_status(&self, url: &str) -> Result<(), StoreError> {
        self.check_online()?;
        self.data.write().await.values.remove(&keys::status(url));
        Ok(())
    }

    async fn add_station(&self, name: &str) -> Result<bool, StoreError> {
        self.sadd(keys::STATIONS.to_string(), name).await
    }

    async fn remove_station(&self, name: &str) -> Result<bool, StoreError> {
        let removed = self.srem(keys::STATIONS, name).await?;
        self.data.write().await.sets.remove(&keys::urls(name));
        Ok(removed)
    }

    async fn add_url(&self, station: &str, url: &str) -> Result<bool, StoreError> {
        self.sadd(keys::urls(station), url).await
    }

    async fn remove_url(&self, station: &str, url: &str) -> Result<bool, StoreError> {
        self.srem(&keys::urls(station), url).await
    }
}

#[async_trait]
impl Connector for MemoryStore {
    fn describe(&self) -> String {
        "memory".into()
    }

    async fn open(&self) -> Result<Arc<dyn StatusStore>, StoreError> {
        self.check_online()?;
        self.connections.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::DownReason;

    #[tokio::test]
    async fn test_sets_follow_key_layout() {
        let store = MemoryStore::new();
        assert!(store.add_station("Work").await.unwrap());
        assert!(!store.add_station("Work").await.unwrap());
        assert!(store.add_url("Work", "https://example.com").await.unwrap());

        assert!(store.raw_members("stations").await.contains("Work"));
        assert!(store.raw_members("urls:Work").await.contains("https://example.com"));
    }

    #[tokio::test]
    async fn test_absent_status_is_pending() {
        let store = MemoryStore::new();
        assert_eq!(store.get_status("https://nowhere.test").await.unwrap(), Status::Pending);
    }

    #[tokio::test]
    async fn test_status_round_trips_through_wire_string() {
        let store = MemoryStore::new();
        store.set_status("https://a.test", &Status::down(DownReason::HttpStatus(502))).await.unwrap();

        assert_eq!(store.raw_value("status:https://a.test").await.as_deref(), Some("DOWN (502)"));
        assert_eq!(
            store.get_status("https://a.test").await.unwrap(),
            Status::down(DownReason::HttpStatus(502))
        );
    }

    #[tokio::test]
    async fn test_garbage_status_is_reported_with_its_value() {
        let store = MemoryStore::new();
        store.set_raw_value("status:https://a.test", "???").await;
        let err = store.get_status("https://a.test").await.unwrap_err();
        assert!(matches!(err, StoreError::UnrecognisedStatus(ref e) if e.0 == "???"));
    }

    #[tokio::test]
    async fn test_remove_station_drops_url_set() {
        let store = MemoryStore::new();
        store.add_station("Work").await.unwrap();
        store.add_url("Work", "https://a.test").await.unwrap();

        assert!(store.remove_station("Work").await.unwrap());
        assert!(store.list_urls("Work").await.unwrap().is_empty());
        assert!(store.list_stations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_offline_store_fails_with_connection_error() {
        let store = MemoryStore::new();
        store.set_offline(true);

        assert!(!store.is_healthy().await);
        let err = store.list_stations().await.unwrap_err();
        assert!(err.is_connection_loss());
        assert!(store.open().await.is_err());

        store.set_offline(false);
        assert!(store.is_healthy().await);
        assert!(store.open().await.is_ok());
        assert_eq!(store.connections(), 1);
    }
}
