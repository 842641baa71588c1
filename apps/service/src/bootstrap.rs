use std::sync::Arc;

use sentinel_store::{Connector, RetryPolicy, StatusStore, StoreError, connect};
use tracing::info;

/// Establish the first store connection before any sweep runs
///
/// Connecting also creates the default station on an empty store. Running out
/// of attempts here is the one failure that stops the service.
pub async fn bootstrap(
    connector: &dyn Connector,
    policy: RetryPolicy,
) -> Result<Arc<dyn StatusStore>, StoreError> {
    info!("Connecting to status store at {} ({} attempts)", connector.describe(), policy.attempts);
    connect(connector, policy).await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use sentinel_store::{DEFAULT_STATION, MemoryStore};

    fn policy() -> RetryPolicy {
        RetryPolicy { attempts: 3, delay: Duration::from_millis(10) }
    }

    #[tokio::test]
    async fn test_bootstrap_seeds_default_station() {
        let backend = MemoryStore::new();
        let store = bootstrap(&backend, policy()).await.unwrap();

        assert!(store.list_stations().await.unwrap().contains(DEFAULT_STATION));
        assert_eq!(backend.raw_members("stations").await.len(), 1);
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let backend = MemoryStore::new();
        bootstrap(&backend, policy()).await.unwrap();
        backend.add_station("Work").await.unwrap();
        bootstrap(&backend, policy()).await.unwrap();

        assert_eq!(backend.raw_members("stations").await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bootstrap_fails_when_store_stays_down() {
        let backend = MemoryStore::new();
        backend.set_offline(true);

        assert!(bootstrap(&backend, policy()).await.is_err());
    }
}
