/// Monitoring engine module - probes every monitored URL on a fixed interval
///
/// This module is responsible for:
/// - Probing HTTP/HTTPS targets and classifying the outcome
/// - Enumerating targets from the status store
/// - Driving the sweep loop, including reconnecting to the store
pub mod checker;
pub mod scheduler;
pub mod targets;
pub mod types;

pub use checker::{HttpProber, Prober};
pub use scheduler::{SweepScheduler, SweepSettings};
