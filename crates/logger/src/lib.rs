//! Shared `tracing` setup for the sentinel binaries

mod subscriber;

pub use subscriber::{LogFormat, init_tracing, init_tracing_with};
