use std::fmt;
use std::time::Duration;

use sentinel_store::Status;

/// Phase of the sweep scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Connecting,
    Sweeping,
    Sleeping,
    Reconnecting,
    Stopped,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerState::Connecting => write!(f, "connecting"),
            SchedulerState::Sweeping => write!(f, "sweeping"),
            SchedulerState::Sleeping => write!(f, "sleeping"),
            SchedulerState::Reconnecting => write!(f, "reconnecting"),
            SchedulerState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Outcome of probing one target within a sweep
#[derive(Debug)]
pub struct ProbeRecord {
    /// 1-based launch position within the sweep
    pub position: usize,
    pub url: String,
    pub status: Status,
    /// Result of writing `status` back to the store
    pub written: Result<(), sentinel_store::StoreError>,
}

/// Summary of one completed sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Sweep number since the scheduler started, starting at 1
    pub sweep: u64,
    pub targets: usize,
    pub stations: usize,
    pub up: usize,
    pub down: usize,
    /// Probes whose status could not be stored
    pub write_failures: usize,
    pub elapsed: Duration,
}

impl SweepReport {
    pub fn new(sweep: u64, targets: usize, stations: usize) -> Self {
        Self { sweep, targets, stations, ..Self::default() }
    }

    /// Number of probes that finished
    pub fn probed(&self) -> usize {
        self.up + self.down
    }

    pub fn count(&mut self, status: &Status) {
        if status.is_up() {
            self.up += 1;
        } else {
            self.down += 1;
        }
    }
}
