use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reason attached to a `DOWN (...)` status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownReason {
    /// The request did not complete within the probe timeout
    Timeout,
    /// DNS, refused connection, TLS handshake and similar failures
    ConnectionError,
    /// The redirect chain looped or exceeded the redirect limit
    TooManyRedirects,
    /// Any other network or protocol failure
    Error,
    /// The probe itself failed unexpectedly
    UnknownError,
    /// A response arrived with a status code other than 200
    HttpStatus(u16),
    /// A reason written by some other producer of the key-space
    Other(String),
}

impl fmt::Display for DownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownReason::Timeout => write!(f, "Timeout"),
            DownReason::ConnectionError => write!(f, "Connection Error"),
            DownReason::TooManyRedirects => write!(f, "Too Many Redirects"),
            DownReason::Error => write!(f, "Error"),
            DownReason::UnknownError => write!(f, "Unknown Error"),
            DownReason::HttpStatus(code) => write!(f, "{code}"),
            DownReason::Other(reason) => write!(f, "{reason}"),
        }
    }
}

impl From<&str> for DownReason {
    fn from(reason: &str) -> Self {
        match reason {
            "Timeout" => DownReason::Timeout,
            "Connection Error" => DownReason::ConnectionError,
            "Too Many Redirects" => DownReason::TooManyRedirects,
            "Error" => DownReason::Error,
            "Unknown Error" => DownReason::UnknownError,
            other => match other.parse::<u16>() {
                Ok(code) => DownReason::HttpStatus(code),
                Err(_) => DownReason::Other(other.to_string()),
            },
        }
    }
}

/// Liveness of a monitored URL as stored under `status:<url>`
///
/// The string form is the wire format: `PENDING`, `UP (<n>ms)` or
/// `DOWN (<reason>)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Status {
    Pending,
    Up { latency_ms: u64 },
    Down(DownReason),
}

impl Status {
    pub fn up(latency_ms: u64) -> Self {
        Status::Up { latency_ms }
    }

    pub fn down(reason: DownReason) -> Self {
        Status::Down(reason)
    }

    pub fn is_up(&self) -> bool {
        matches!(self, Status::Up { .. })
    }

    pub fn is_down(&self) -> bool {
        matches!(self, Status::Down(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Status::Pending)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pending => write!(f, "PENDING"),
            Status::Up { latency_ms } => write!(f, "UP ({latency_ms}ms)"),
            Status::Down(reason) => write!(f, "DOWN ({reason})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognised status value: {0:?}")]
pub struct ParseStatusError(pub String);

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "PENDING" {
            return Ok(Status::Pending);
        }

        let bracketed = |prefix: &str| {
            s.strip_prefix(prefix).and_then(|rest| rest.strip_prefix(" (")).and_then(|rest| rest.strip_suffix(')'))
        };

        if let Some(inner) = bracketed("UP") {
            return inner
                .strip_suffix("ms")
                .and_then(|ms| ms.parse().ok())
                .map(Status::up)
                .ok_or_else(|| ParseStatusError(s.to_string()));
        }

        match bracketed("DOWN") {
            Some(reason) if !reason.is_empty() => Ok(Status::Down(DownReason::from(reason))),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.to_string()
    }
}

impl TryFrom<String> for Status {
    type Error = ParseStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
