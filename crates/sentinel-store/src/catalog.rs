//! Station and URL management used by the dashboard
//!
//! These operations sit on top of [`StatusStore`] and enforce the rules the
//! monitoring service relies on: the default station always exists, URLs are
//! stored in normalised form, and a status key lives exactly as long as some
//! station still references its URL.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::DEFAULT_STATION;
use crate::connect::ensure_default_station;
use crate::error::StoreError;
use crate::status::Status;
use crate::store::StatusStore;

pub const MAX_STATION_NAME_LEN: usize = 50;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Station name cannot be empty")]
    EmptyName,

    #[error("Station name too long (max 50 characters)")]
    NameTooLong,

    #[error("Station \"{0}\" already exists")]
    StationExists(String),

    #[error("Cannot delete the General station")]
    ProtectedStation,

    #[error("Station \"{0}\" does not exist")]
    UnknownStation(String),

    #[error("URL cannot be empty")]
    EmptyUrl,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("URL already exists in {0}")]
    UrlExists(String),
}

/// One monitored URL and its last recorded status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlStatus {
    pub url: String,
    pub status: Status,
}

/// Point-in-time view of every station and the status of its URLs
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub stations: BTreeMap<String, Vec<UrlStatus>>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub up: usize,
    pub down: usize,
    pub pending: usize,
}

impl StatusSnapshot {
    /// Counts per station entry; a URL listed under two stations counts twice
    pub fn summary(&self) -> Summary {
        self.stations.values().flatten().fold(Summary::default(), |mut summary, entry| {
            summary.total += 1;
            match entry.status {
                Status::Pending => summary.pending += 1,
                Status::Up { .. } => summary.up += 1,
                Status::Down(_) => summary.down += 1,
            }
            summary
        })
    }
}

/// Turn user input into the canonical stored form
///
/// Adds `https://` when no http(s) scheme is given and strips trailing
/// slashes, so `example.com/` and `https://example.com` are the same target.
pub fn normalize_url(raw: &str) -> Result<String, CatalogError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::EmptyUrl);
    }

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let normalized = with_scheme.trim_end_matches('/').to_string();

    let parsed = Url::parse(&normalized).map_err(|e| CatalogError::InvalidUrl(format!("{normalized}: {e}")))?;
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(CatalogError::InvalidUrl(format!("{normalized}: missing host")));
    }

    Ok(normalized)
}

pub async fn add_station(store: &dyn StatusStore, name: &str) -> Result<String, CatalogError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CatalogError::EmptyName);
    }
    if name.chars().count() > MAX_STATION_NAME_LEN {
        return Err(CatalogError::NameTooLong);
    }

    if !store.add_station(name).await? {
        return Err(CatalogError::StationExists(name.to_string()));
    }

    info!(station = name, "Created station");
    Ok(name.to_string())
}

/// Delete a station and its URL set
///
/// Status keys of URLs that no other station references are deleted as well.
/// Returns the number of URLs the station held.
pub async fn delete_station(store: &dyn StatusStore, name: &str) -> Result<usize, CatalogError> {
    if name == DEFAULT_STATION {
        return Err(CatalogError::ProtectedStation);
    }

    let urls = store.list_urls(name).await?;
    if !store.remove_station(name).await? {
        return Err(CatalogError::UnknownStation(name.to_string()));
    }

    for url in &urls {
        if !is_referenced(store, url).await? {
            store.delete_status(url).await?;
        }
    }

    info!(station = name, urls = urls.len(), "Deleted station");
    Ok(urls.len())
}

/// Add a URL to a station and mark it `PENDING`
///
/// Returns the normalised URL.
pub async fn add_url(store: &dyn StatusStore, station: &str, raw: &str) -> Result<String, CatalogError> {
    let url = normalize_url(raw)?;

    if !store.list_stations().await?.contains(station) {
        return Err(CatalogError::UnknownStation(station.to_string()));
    }
    if !store.add_url(station, &url).await? {
        return Err(CatalogError::UrlExists(station.to_string()));
    }
    store.set_status(&url, &Status::Pending).await?;

    info!(station, url = %url, "Added URL");
    Ok(url)
}

/// Remove a URL from one station
///
/// The status key is deleted only when no station references the URL any
/// more. Returns whether it was deleted.
pub async fn delete_url(store: &dyn StatusStore, station: &str, url: &str) -> Result<bool, CatalogError> {
    store.remove_url(station, url).await?;

    let orphaned = !is_referenced(store, url).await?;
    if orphaned {
        store.delete_status(url).await?;
    }

    info!(station, url, orphaned, "Deleted URL");
    Ok(orphaned)
}

/// Whether any station still lists `url`
///
/// Scans every station; there is no reverse index from URL to stations.
pub async fn is_referenced(store: &dyn StatusStore, url: &str) -> Result<bool, StoreError> {
    for station in store.list_stations().await? {
        if store.list_urls(&station).await?.contains(url) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Read every station, URL and status
///
/// Creates the default station first when there are no stations at all. A
/// status value that cannot be read shows as pending rather than failing the
/// whole view.
pub async fn snapshot(store: &dyn StatusStore) -> Result<StatusSnapshot, StoreError> {
    ensure_default_station(store).await?;

    let mut stations = BTreeMap::new();
    for station in store.list_stations().await? {
        let mut urls: Vec<String> = store.list_urls(&station).await?.into_iter().collect();
        urls.sort();

        let mut entries = Vec::with_capacity(urls.len());
        for url in urls {
            let status = match store.get_status(&url).await {
                Ok(status) => status,
                Err(StoreError::UnrecognisedStatus(err)) => {
                    if !err.0.is_empty() {
                        warn!(url = %url, "Showing unreadable status as pending: {err}");
                    }
                    Status::Pending
                }
                Err(err) => return Err(err),
            };
            entries.push(UrlStatus { url, status });
        }
        stations.insert(station, entries);
    }

    Ok(StatusSnapshot { stations, timestamp: Utc::now() })
}
