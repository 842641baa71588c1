use std::{fmt, fs, io, path, time::Duration};

use clap::Parser;
use sentinel_store::StoreConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::monitoring::SweepSettings;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read {path}: {source}")]
    ReadFailed { path: path::PathBuf, source: io::Error },
    #[error("Failed to parse {path}: {source}")]
    ParseFailed { path: path::PathBuf, source: toml::de::Error },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub monitor: Monitor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Monitor {
    pub check_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub pacing_ms: u64,
    pub concurrency: usize,
    pub error_backoff_secs: u64,
}

impl Default for Monitor {
    fn default() -> Self {
        Self {
            check_interval_secs: 10,
            request_timeout_secs: 5,
            pacing_ms: 100,
            concurrency: 1,
            error_backoff_secs: 5,
        }
    }
}

impl Monitor {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Command line of the monitoring service. Every setting can also come from
/// the environment.
#[derive(Debug, Parser)]
#[command(name = "sentinel-service", version, about = "Probes monitored URLs and records their status")]
pub struct Args {
    /// TOML file with `[store]` and `[monitor]` sections
    #[arg(short, long, env = "SENTINEL_CONFIG")]
    pub config: Option<path::PathBuf>,

    #[arg(long, env = "REDIS_HOST")]
    pub redis_host: Option<String>,

    #[arg(long, env = "REDIS_DB_PORT")]
    pub redis_port: Option<u16>,

    /// Seconds between the end of one sweep and the start of the next
    #[arg(long, env = "CHECK_INTERVAL", value_parser = clap::value_parser!(u64).range(1..))]
    pub check_interval: Option<u64>,

    /// Per-probe timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", value_parser = clap::value_parser!(u64).range(1..))]
    pub request_timeout: Option<u64>,

    /// Milliseconds between two probe launches
    #[arg(long, env = "PROBE_PACING_MS")]
    pub pacing_ms: Option<u64>,

    /// Probes in flight at once
    #[arg(long, env = "PROBE_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Seconds to wait after an unexpected error in the loop
    #[arg(long, env = "ERROR_BACKOFF")]
    pub error_backoff: Option<u64>,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub print_config: bool,
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Internal Configuration State:")?;
        write_title_1(f, "Store")?;
        write_1(f, "Address", &format_args!("{}:{}", self.store.host, self.store.port))?;
        write_1(f, "Database", &self.store.db)?;
        write_1(f, "Connect Timeout (s)", &self.store.connect_timeout_secs)?;
        write_1(f, "Command Timeout (s)", &self.store.command_timeout_secs)?;
        write_1(f, "Connect Attempts", &self.store.connect_attempts)?;
        write_1(f, "Retry Delay (s)", &self.store.retry_delay_secs)?;
        write_title_1(f, "Monitor")?;
        write_1(f, "Check Interval (s)", &self.monitor.check_interval_secs)?;
        write_1(f, "Request Timeout (s)", &self.monitor.request_timeout_secs)?;
        write_1(f, "Pacing (ms)", &self.monitor.pacing_ms)?;
        write_1(f, "Concurrency", &self.monitor.concurrency)?;
        write_1(f, "Error Backoff (s)", &self.monitor.error_backoff_secs)?;

        Ok(())
    }
}

impl Config {
    /// Defaults, then the config file if one was given, then environment and
    /// flags
    pub fn load(args: &Args) -> Result<Self, Error> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply(args);
        config.validate()?;
        Ok(config)
    }

    /// Read a config file. Missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<path::Path>) -> Result<Self, Error> {
        let path = normalize_toml_path(path.as_ref());
        let raw = fs::read_to_string(&path).map_err(|source| Error::ReadFailed { path: path.clone(), source })?;
        toml::from_str(&raw).map_err(|source| Error::ParseFailed { path, source })
    }

    /// Overlay whatever was set on the command line or in the environment
    pub fn apply(&mut self, args: &Args) {
        if let Some(host) = &args.redis_host {
            self.store.host = host.clone();
        }
        if let Some(port) = args.redis_port {
            self.store.port = port;
        }
        if let Some(interval) = args.check_interval {
            self.monitor.check_interval_secs = interval;
        }
        if let Some(timeout) = args.request_timeout {
            self.monitor.request_timeout_secs = timeout;
        }
        if let Some(pacing) = args.pacing_ms {
            self.monitor.pacing_ms = pacing;
        }
        if let Some(concurrency) = args.concurrency {
            self.monitor.concurrency = concurrency;
        }
        if let Some(backoff) = args.error_backoff {
            self.monitor.error_backoff_secs = backoff;
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.monitor.check_interval_secs == 0 {
            return Err(Error::Invalid("check interval must be at least 1 second".into()));
        }
        if self.monitor.request_timeout_secs == 0 {
            return Err(Error::Invalid("request timeout must be at least 1 second".into()));
        }
        if self.monitor.concurrency == 0 {
            return Err(Error::Invalid("concurrency must be at least 1".into()));
        }
        if self.store.host.trim().is_empty() {
            return Err(Error::Invalid("store host cannot be empty".into()));
        }
        Ok(())
    }

    pub fn sweep_settings(&self) -> SweepSettings {
        SweepSettings {
            interval: Duration::from_secs(self.monitor.check_interval_secs),
            pacing: Duration::from_millis(self.monitor.pacing_ms),
            concurrency: self.monitor.concurrency,
            error_backoff: Duration::from_secs(self.monitor.error_backoff_secs),
            retry: self.store.retry_policy(),
        }
    }
}
