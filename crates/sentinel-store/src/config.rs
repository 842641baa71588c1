//! Store connection configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Connection settings for the Redis-compatible backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    /// Logical database index
    pub db: i64,
    pub connect_timeout_secs: u64,
    /// Upper bound for any single command round-trip
    pub command_timeout_secs: u64,
    /// Connection attempts before giving up
    pub connect_attempts: u32,
    pub retry_delay_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 6379,
            db: 0,
            connect_timeout_secs: 5,
            command_timeout_secs: 5,
            connect_attempts: 5,
            retry_delay_secs: 2,
        }
    }
}

impl StoreConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port, ..Self::default() }
    }

    /// `redis://host:port/db`
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.connect_attempts,
            delay: Duration::from_secs(self.retry_delay_secs),
        }
    }
}

/// Bounded retry with a fixed delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        StoreConfig::default().retry_policy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.url(), "redis://localhost:6379/0");
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.retry_policy(), RetryPolicy { attempts: 5, delay: Duration::from_secs(2) });
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: StoreConfig = serde_json::from_str(r#"{"host":"redis","port":6380}"#).unwrap();
        assert_eq!(config.url(), "redis://redis:6380/0");
        assert_eq!(config.command_timeout_secs, 5);
    }
}
