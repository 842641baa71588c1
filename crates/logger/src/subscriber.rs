use std::env::var;
use std::str::FromStr;

use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format selected through `RUST_LOG_FORMAT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "compact" | "text" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other:?}")),
        }
    }
}

/// Install the global subscriber at `info`, honouring `RUST_LOG` and
/// `RUST_LOG_FORMAT`
pub fn init_tracing() {
    let (format, problem) = match var("RUST_LOG_FORMAT") {
        Ok(raw) => match raw.parse() {
            Ok(format) => (format, None),
            Err(err) => (LogFormat::default(), Some(err)),
        },
        Err(_) => (LogFormat::default(), None),
    };

    init_tracing_with(LevelFilter::INFO, format);

    if let Some(problem) = problem {
        warn!("Ignoring RUST_LOG_FORMAT, falling back to compact: {problem}");
    }
}

/// Install the global subscriber with an explicit default level and format.
/// Does nothing if a subscriber is already installed.
pub fn init_tracing_with(level: LevelFilter, format: LogFormat) {
    let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    let log_layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().with_filter(env_filter).boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer().compact().with_filter(env_filter).boxed(),
    };

    let _ = tracing_subscriber::registry().with(log_layer).try_init();
}
