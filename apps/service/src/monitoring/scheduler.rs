use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use sentinel_store::{Connector, DownReason, RetryPolicy, Status, StatusStore, StoreError, connect};
use thiserror::Error;
use tokio::sync::{AcquireError, Semaphore, watch};
use tokio::task::{JoinError, JoinSet};
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};

use super::checker::Prober;
use super::targets::enumerate;
use super::types::{ProbeRecord, SchedulerState, SweepReport};

/// Timing and parallelism of the sweep loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSettings {
    /// Pause between the end of one sweep and the start of the next
    pub interval: Duration,
    /// Minimum gap between two probe launches
    pub pacing: Duration,
    /// Probes allowed in flight at once
    pub concurrency: usize,
    /// Pause after an unexpected sweep failure
    pub error_backoff: Duration,
    /// Connection budget, per (re)connect cycle
    pub retry: RetryPolicy,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            pacing: Duration::from_millis(100),
            concurrency: 1,
            error_backoff: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        }
    }
}

/// Why a sweep stopped early
#[derive(Debug, Error)]
pub enum SweepError {
    /// The store connection is gone; reconnect before sweeping again
    #[error("Lost connection to status store: {0}")]
    ConnectionLost(StoreError),

    #[error("Status store error: {0}")]
    Store(StoreError),

    #[error("Probe task failed: {0}")]
    Task(#[from] JoinError),

    #[error("Probe limiter closed: {0}")]
    Limiter(#[from] AcquireError),
}

impl From<StoreError> for SweepError {
    fn from(err: StoreError) -> Self {
        if err.is_connection_loss() { SweepError::ConnectionLost(err) } else { SweepError::Store(err) }
    }
}

/// Sweep scheduler - repeatedly probes every monitored URL
///
/// Owns its store connection. Losing the connection replaces the handle with
/// a fresh one from the connector; nothing else holds on to it.
pub struct SweepScheduler {
    connector: Arc<dyn Connector>,
    prober: Arc<dyn Prober>,
    settings: SweepSettings,
    store: Option<Arc<dyn StatusStore>>,
    sweeps: u64,
    state: watch::Sender<SchedulerState>,
}

impl SweepScheduler {
    /// Create a new sweep scheduler
    pub fn new(connector: Arc<dyn Connector>, prober: Arc<dyn Prober>, settings: SweepSettings) -> Self {
        let (state, _) = watch::channel(SchedulerState::Connecting);
        Self { connector, prober, settings, store: None, sweeps: 0, state }
    }

    /// Start from an already established connection instead of connecting
    /// on the first run
    pub fn with_store(mut self, store: Arc<dyn StatusStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Watch the scheduler move between states
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    /// Sweep until `shutdown` resolves
    ///
    /// Only fails when no connection could be made before the first sweep.
    /// After that, connection loss leads to reconnecting and any other error
    /// to a short back-off, so the loop keeps going.
    pub async fn run<F>(mut self, shutdown: F) -> Result<(), StoreError>
    where
        F: Future<Output = ()>,
    {
        let result = tokio::select! {
            _ = shutdown => {
                info!("Received shutdown signal. Exiting gracefully...");
                Ok(())
            }
            result = self.drive() => result,
        };

        self.transition(SchedulerState::Stopped);
        result
    }

    async fn drive(&mut self) -> Result<(), StoreError> {
        if self.store.is_none() {
            self.transition(SchedulerState::Connecting);
            self.store = Some(connect(self.connector.as_ref(), self.settings.retry).await?);
        }

        loop {
            self.transition(SchedulerState::Sweeping);

            match self.sweep().await {
                Ok(report) => {
                    let next = self.settings.interval;
                    info!(
                        "Check #{} completed in {:.2}s: {}/{} probed across {} stations, {} up, {} down. Next check in {}s",
                        report.sweep,
                        report.elapsed.as_secs_f64(),
                        report.probed(),
                        report.targets,
                        report.stations,
                        report.up,
                        report.down,
                        next.as_secs()
                    );
                    if report.write_failures > 0 {
                        warn!("{} statuses could not be stored this round", report.write_failures);
                    }
                    if report.elapsed > next {
                        warn!(
                            "Check #{} took longer than the {}s interval; consider fewer targets or more concurrency",
                            report.sweep,
                            next.as_secs()
                        );
                    }

                    self.transition(SchedulerState::Sleeping);
                    sleep(next).await;
                }
                Err(SweepError::ConnectionLost(err)) => {
                    error!("Lost connection to status store: {err}");
                    self.reconnect().await;
                }
                Err(err) => {
                    error!("Unexpected error in monitoring loop: {err}");
                    sleep(self.settings.error_backoff).await;
                }
            }
        }
    }

    /// Replace the store handle, retrying until the backend is back
    async fn reconnect(&mut self) {
        self.transition(SchedulerState::Reconnecting);
        self.store = None;
        info!("Attempting to reconnect...");

        loop {
            match connect(self.connector.as_ref(), self.settings.retry).await {
                Ok(store) => {
                    self.store = Some(store);
                    return;
                }
                Err(err) => {
                    warn!("Status store still unreachable, retrying in {:?}: {err}", self.settings.error_backoff);
                    sleep(self.settings.error_backoff).await;
                }
            }
        }
    }

    /// Probe every current target once and store the results
    ///
    /// A panicking probe is recorded as `DOWN (Unknown Error)`. A failed status
    /// write is logged and skipped unless it means the connection is gone, in
    /// which case the sweep is abandoned.
    pub async fn sweep(&mut self) -> Result<SweepReport, SweepError> {
        let Some(store) = self.store.clone() else {
            return Err(SweepError::ConnectionLost(StoreError::Connection("not connected".into())));
        };

        self.sweeps += 1;
        let started = Instant::now();

        let targets = enumerate(store.as_ref()).await?;
        let total = targets.len();
        let mut report = SweepReport::new(self.sweeps, total, targets.stations);

        info!("=== Check #{}: {} URLs across {} stations ===", self.sweeps, total, targets.stations);

        if targets.is_empty() {
            warn!("No URLs to monitor");
            report.elapsed = started.elapsed();
            return Ok(report);
        }

        let limiter = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let mut probes = JoinSet::new();

        for (index, url) in targets.urls.into_iter().enumerate() {
            let permit = limiter.clone().acquire_owned().await?;
            if index > 0 {
                sleep(self.settings.pacing).await;
            }

            while let Some(done) = probes.try_join_next() {
                record(&mut report, done?, total)?;
            }

            let prober = self.prober.clone();
            let store = store.clone();
            probes.spawn(async move {
                let _permit = permit;
                let status = match AssertUnwindSafe(prober.probe(&url)).catch_unwind().await {
                    Ok(status) => status,
                    Err(_) => {
                        error!("Unexpected error checking {url}");
                        Status::down(DownReason::UnknownError)
                    }
                };
                let written = store.set_status(&url, &status).await;
                ProbeRecord { position: index + 1, url, status, written }
            });
        }

        while let Some(done) = probes.join_next().await {
            record(&mut report, done?, total)?;
        }

        report.elapsed = started.elapsed();
        Ok(report)
    }

    fn transition(&self, next: SchedulerState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!("Scheduler {previous} -> {next}");
        }
    }
}

fn record(report: &mut SweepReport, probe: ProbeRecord, total: usize) -> Result<(), SweepError> {
    let ProbeRecord { position, url, status, written } = probe;
    report.count(&status);

    match written {
        Ok(()) if status.is_up() => info!("[{position}/{total}] ✓ {url}: {status}"),
        Ok(()) => warn!("[{position}/{total}] ✗ {url}: {status}"),
        Err(err) if err.is_connection_loss() => return Err(SweepError::ConnectionLost(err)),
        Err(err) => {
            error!("Error processing {url}: {err}");
            report.write_failures += 1;
        }
    }

    Ok(())
}
