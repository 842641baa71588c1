use std::collections::HashSet;

use sentinel_store::{StatusStore, StoreError};

/// Deduplicated URLs to probe in one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Targets {
    pub urls: HashSet<String>,
    /// Stations seen while enumerating
    pub stations: usize,
}

impl Targets {
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Collect every URL of every station
///
/// This is a point-in-time read without any lock, so stations or URLs changed
/// while it runs may or may not show up until the next sweep.
pub async fn enumerate(store: &dyn StatusStore) -> Result<Targets, StoreError> {
    let stations = store.list_stations().await?;

    let mut urls = HashSet::new();
    for station in &stations {
        urls.extend(store.list_urls(station).await?);
    }

    Ok(Targets { urls, stations: stations.len() })
}
