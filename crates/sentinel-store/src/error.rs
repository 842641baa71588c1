//! Error types for status store operations

use redis::RedisError;
use thiserror::Error;

use crate::status::ParseStatusError;

/// Errors that can occur while talking to the status store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend unreachable, refused or dropped the connection
    #[error("Connection error: {0}")]
    Connection(String),

    /// Connect or command did not finish in time
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Backend answered with an error or an unexpected value
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),

    /// A status key holds text outside the status format
    #[error(transparent)]
    UnrecognisedStatus(#[from] ParseStatusError),
}

impl StoreError {
    /// Whether the error means the connection itself is gone and should be
    /// re-established rather than retried
    pub fn is_connection_loss(&self) -> bool {
        matches!(self, StoreError::Connection(_) | StoreError::Timeout(_))
    }
}

impl From<RedisError> for StoreError {
    fn from(err: RedisError) -> Self {
        if err.is_timeout() {
            StoreError::Timeout(format!("Redis timeout: {err}"))
        } else if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
            StoreError::Connection(format!("Redis connection error: {err}"))
        } else {
            StoreError::Backend(format!("Redis error: {err}"))
        }
    }
}
