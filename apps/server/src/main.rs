#![warn(clippy::all, clippy::pedantic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, web};
use meshcheck::config::ServerConfig;
use meshcheck::{LivenessRegistry, ResultStore, report};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

mod error;
mod routes;
mod state;

use error::AppError;
use logger::init_tracing;
use state::AppState;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    init_tracing();

    let config = ServerConfig::from_env();
    info!(?config, "observer starting");

    let registry = Arc::new(LivenessRegistry::new(config.record_ttl));
    let _sweeper = registry.spawn_sweeper(config.sweep_interval);
    let store = Arc::new(ResultStore::new());

    let shutdown = CancellationToken::new();
    tokio::spawn(report_loop(
        Arc::clone(&registry),
        Arc::clone(&store),
        config.report_interval,
        shutdown.clone(),
    ));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    let state = web::Data::new(AppState { registry, store });

    info!(%addr, "observer API listening");
    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes::routes))
        .bind(addr)?
        .run()
        .await?;

    shutdown.cancel();
    info!("observer stopped");
    Ok(())
}

/// Log the aggregated network report at a fixed interval.
async fn report_loop(
    registry: Arc<LivenessRegistry>,
    store: Arc<ResultStore>,
    every: Duration,
    shutdown: CancellationToken,
) {
    let mut timer = tokio::time::interval(every);
    // skip the immediate first tick, there is nothing to report yet
    timer.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = timer.tick() => {
                let report = report::generate(&registry, &store);
                match serde_json::to_string(&report) {
                    Ok(body) => info!(report = %body, "network report"),
                    Err(err) => warn!(%err, "network report could not be serialized"),
                }
            }
        }
    }
}
