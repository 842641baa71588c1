//! Redis/Valkey status store

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisResult};
use tokio::time::timeout;

use crate::config::StoreConfig;
use crate::connect::Connector;
use crate::error::StoreError;
use crate::keys;
use crate::status::Status;
use crate::store::StatusStore;

/// Redis-backed status store
///
/// Wraps a `ConnectionManager`, which is cheap to clone and multiplexes
/// commands over one connection. Every command is bounded by the configured
/// command timeout.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    command_timeout: Duration,
}

impl RedisStore {
    /// Open a connection to the backend described by `config`
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if the connection URL cannot be parsed
    /// - `Timeout` if the connection is not established within the connect timeout
    /// - `Connection` if the server refuses the connection
    pub async fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::open(config.url())
            .map_err(|e| StoreError::InvalidConfig(format!("Invalid Redis URL: {e}")))?;

        let conn = timeout(config.connect_timeout(), ConnectionManager::new(client))
            .await
            .map_err(|_| {
                StoreError::Timeout(format!(
                    "no connection to {} within {:?}",
                    config.url(),
                    config.connect_timeout()
                ))
            })??;

        Ok(Self { conn, command_timeout: config.command_timeout() })
    }

    async fn run<T, F>(&self, command: &str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match timeout(self.command_timeout, fut).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout(format!(
                "{command} did not complete within {:?}",
                self.command_timeout
            ))),
        }
    }
}

#[async_trait]
impl StatusStore for RedisStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let pong: String =
            self.run("PING", async move { redis::cmd("PING").query_async(&mut conn).await }).await?;

        if pong == "PONG" {
            Ok(())
        } else {
            Err(StoreError::Backend(format!("unexpected PING reply: {pong}")))
        }
    }

    async fn list_stations(&self) -> Result<HashSet<String>, StoreError> {
        let mut conn = self.conn.clone();
        self.run("SMEMBERS", async move { conn.smembers::<_, HashSet<String>>(keys::STATIONS).await }).await
    }

    async fn list_urls(&self, station: &str) -> Result<HashSet<String>, StoreError> {
        let mut conn = self.conn.clone();
        let key = keys::urls(station);
        self.run("SMEMBERS", async move { conn.smembers::<_, HashSet<String>>(key).await }).await
    }

    async fn get_status(&self, url: &str) -> Result<Status, StoreError> {
        let mut conn = self.conn.clone();
        let key = keys::status(url);
        let raw: Option<String> = self.run("GET", async move { conn.get::<_, Option<String>>(key).await }).await?;

        match raw {
            Some(raw) => Ok(raw.parse()?),
            None => Ok(Status::Pending),
        }
    }

    async fn set_status(&self, url: &str, status: &Status) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let key = keys::status(url);
        let value = status.to_string();
        self.run("SET", async move { conn.set::<_, _, ()>(key, value).await }).await
    }

    async fn delete_status(&self, url: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let key = keys::status(url);
        let _: i64 = self.run("DEL", async move { conn.del::<_, i64>(key).await }).await?;
        Ok(())
    }

    async fn add_station(&self, name: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let name = name.to_string();
        let added: i64 = self.run("SADD", async move { conn.sadd::<_, _, i64>(keys::STATIONS, name).await }).await?;
        Ok(added > 0)
    }

    async fn remove_station(&self, name: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let urls_key = keys::urls(name);
        let name = name.to_string();
        let (removed, _): (i64, i64) = self
            .run("SREM/DEL", async move {
                redis::pipe()
                    .atomic()
                    .srem(keys::STATIONS, name)
                    .del(urls_key)
                    .query_async(&mut conn)
                    .await
            })
            .await?;
        Ok(removed > 0)
    }

    async fn add_url(&self, station: &str, url: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let key = keys::urls(station);
        let url = url.to_string();
        let added: i64 = self.run("SADD", async move { conn.sadd::<_, _, i64>(key, url).await }).await?;
        Ok(added > 0)
    }

    async fn remove_url(&self, station: &str, url: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let key = keys::urls(station);
        let url = url.to_string();
        let removed: i64 = self.run("SREM", async move { conn.srem::<_, _, i64>(key, url).await }).await?;
        Ok(removed > 0)
    }
}

/// Opens `RedisStore` connections from a fixed configuration
#[derive(Debug, Clone)]
pub struct RedisConnector {
    config: StoreConfig,
}

impl RedisConnector {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

#[async_trait]
impl Connector for RedisConnector {
    fn describe(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    async fn open(&self) -> Result<Arc<dyn StatusStore>, StoreError> {
        Ok(Arc::new(RedisStore::open(&self.config).await?))
    }
}
