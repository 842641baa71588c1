mod bootstrap;
mod config;
mod monitoring;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sentinel_store::RedisConnector;
use tracing::info;

use config::{Args, Config};
use monitoring::{HttpProber, SweepScheduler, checker::browser_headers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = Config::load(&args)?;
    if args.print_config {
        print!("{config}");
        return Ok(());
    }

    logger::init_tracing();

    info!("{}", "=".repeat(60));
    info!("URL Sentinel Monitor Starting");
    info!("Redis: {}:{}", config.store.host, config.store.port);
    info!("Check Interval: {}s", config.monitor.check_interval_secs);
    info!("Request Timeout: {}s", config.monitor.request_timeout_secs);
    info!("{}", "=".repeat(60));

    let connector = Arc::new(RedisConnector::new(config.store.clone()));
    let store = bootstrap::bootstrap(connector.as_ref(), config.store.retry_policy())
        .await
        .context("Failed to connect to the status store after all retries")?;

    let prober = HttpProber::new(config.monitor.request_timeout(), browser_headers())
        .context("Failed to build HTTP client")?;

    SweepScheduler::new(connector, Arc::new(prober), config.sweep_settings())
        .with_store(store)
        .run(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
