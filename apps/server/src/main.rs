#![warn(clippy::all, clippy::pedantic)]

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use anyhow::Context;
use clap::Parser;
use sentinel_store::{RedisConnector, StatusStore, StoreConfig, connect};
use tracing::info;

mod error;
mod routes;

use error::AppError;
use logger::init_tracing;

/// Dashboard API over the shared status store
#[derive(Debug, Parser)]
#[command(name = "sentinel-server", version)]
struct Args {
    #[arg(long, env = "BIND", default_value = "0.0.0.0")]
    bind: IpAddr,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    port: u16,

    #[arg(long, env = "REDIS_HOST", default_value = "localhost")]
    redis_host: String,

    #[arg(long, env = "REDIS_DB_PORT", default_value_t = 6379)]
    redis_port: u16,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing();

    let config = StoreConfig::new(args.redis_host, args.redis_port);
    let connector = RedisConnector::new(config.clone());
    info!("Connecting to status store at {}:{}", config.host, config.port);
    let store = connect(&connector, config.retry_policy())
        .await
        .context("Failed to connect to the status store after all retries")?;

    let addr = SocketAddr::new(args.bind, args.port);
    run_server(addr, store).await.with_context(|| format!("Dashboard server on {addr} failed"))
}

async fn run_server(addr: SocketAddr, store: Arc<dyn StatusStore>) -> Result<(), AppError> {
    info!("Dashboard listening on http://{addr}");
    HttpServer::new(move || App::new().app_data(web::Data::from(store.clone())).configure(routes::routes))
        .bind(addr)?
        .run()
        .await?;

    Ok(())
}
