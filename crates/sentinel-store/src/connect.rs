//! Connection establishment with bounded retry

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::DEFAULT_STATION;
use crate::config::RetryPolicy;
use crate::error::StoreError;
use crate::store::StatusStore;

/// Factory for fresh store connections
///
/// Callers own the resulting handle; re-connecting means asking the
/// connector for a new one.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Human readable backend address for logs
    fn describe(&self) -> String;

    /// Open a single connection, without retrying
    async fn open(&self) -> Result<Arc<dyn StatusStore>, StoreError>;
}

/// Connect to the store, verify it answers and make sure the default station
/// exists
///
/// Retries up to `policy.attempts` times with `policy.delay` between
/// attempts. The last error is returned once the budget is exhausted.
pub async fn connect(
    connector: &dyn Connector,
    policy: RetryPolicy,
) -> Result<Arc<dyn StatusStore>, StoreError> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match try_connect(connector).await {
            Ok(store) => {
                info!(backend = %connector.describe(), attempt, "Connected to status store");
                return Ok(store);
            }
            Err(err) if attempt < attempts => {
                error!("Connection attempt {attempt}/{attempts} failed: {err}");
                sleep(policy.delay).await;
            }
            Err(err) => {
                error!("Connection attempt {attempt}/{attempts} failed: {err}");
                error!(backend = %connector.describe(), "Failed to connect to status store after all retries");
                return Err(err);
            }
        }
    }
}

async fn try_connect(connector: &dyn Connector) -> Result<Arc<dyn StatusStore>, StoreError> {
    let store = connector.open().await?;
    store.ping().await?;
    ensure_default_station(store.as_ref()).await?;
    Ok(store)
}

/// Create the default station when no station exists yet
///
/// Returns `true` if the station was created.
pub async fn ensure_default_station(store: &dyn StatusStore) -> Result<bool, StoreError> {
    if !store.list_stations().await?.is_empty() {
        return Ok(false);
    }

    let created = store.add_station(DEFAULT_STATION).await?;
    if created {
        info!("Created default '{DEFAULT_STATION}' station");
    } else {
        warn!("Default station appeared concurrently");
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::memory::MemoryStore;

    fn quick_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy { attempts, delay: Duration::from_millis(10) }
    }

    #[tokio::test]
    async fn test_connect_creates_default_station() {
        let backend = MemoryStore::new();
        let store = connect(&backend, quick_policy(1)).await.unwrap();

        let stations = store.list_stations().await.unwrap();
        assert_eq!(stations.len(), 1);
        assert!(stations.contains(DEFAULT_STATION));
    }

    #[tokio::test]
    async fn test_connect_keeps_existing_stations() {
        let backend = MemoryStore::new();
        backend.add_station("Work").await.unwrap();

        let store = connect(&backend, quick_policy(1)).await.unwrap();

        let stations = store.list_stations().await.unwrap();
        assert_eq!(stations.len(), 1);
        assert!(stations.contains("Work"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_gives_up_after_budget() {
        let backend = MemoryStore::new();
        backend.set_offline(true);

        let err = connect(&backend, quick_policy(3)).await.err().unwrap();
        assert!(err.is_connection_loss());
        assert_eq!(backend.connections(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_succeeds_on_later_attempt() {
        let backend = MemoryStore::new();
        backend.set_offline(true);

        let revive = backend.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(15)).await;
            revive.set_offline(false);
        });

        let store = connect(&backend, quick_policy(5)).await.unwrap();
        assert!(store.is_healthy().await);
        assert_eq!(backend.connections(), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let backend = MemoryStore::new();
        assert!(connect(&backend, quick_policy(0)).await.is_ok());
    }
}
